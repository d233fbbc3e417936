//! Core scalar types shared across the hook engine.

/// Hook execution priority (lower number = earlier execution). Ties within
/// the same priority break lexically on the hook's `id()`.
pub type HookPriority = i32;

/// Priority constants for common use cases.
pub const PRIORITY_FIRST: HookPriority = -1000;
pub const PRIORITY_EARLY: HookPriority = -100;
pub const PRIORITY_NORMAL: HookPriority = 0;
pub const PRIORITY_LATE: HookPriority = 100;
pub const PRIORITY_LAST: HookPriority = 1000;

/// Static identity of a registered hook, independent of its runtime state.
#[derive(Debug, Clone)]
pub struct HookMetadata {
    /// Unique identifier, e.g. `"dangerous-command-guard"`. Used in policy
    /// `order`/`disabled` lists and in audit records.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Execution priority (lower = earlier) used when the policy does not
    /// specify an explicit `order`.
    pub priority: HookPriority,
}

impl HookMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority: PRIORITY_NORMAL,
        }
    }

    pub fn with_priority(mut self, priority: HookPriority) -> Self {
        self.priority = priority;
        self
    }
}
