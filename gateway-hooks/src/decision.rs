//! The one kind of decision that crosses the dispatcher boundary: a guard
//! rejection. Everything else a hook does — mutating the event payload,
//! registering pending context, writing to the audit sink — it does
//! directly against [`crate::context::HookContext`], since dispatch is
//! strictly sequential and there is no parallel-execution effect queue to
//! reconcile.

use std::fmt;

/// A guard hook's refusal to let the triggering action proceed.
///
/// This is the only error variant that crosses the dispatcher boundary
/// (persistence failures, malformed policy fields and the like are
/// swallowed and logged inside the hook that hit them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRejection {
    /// Stable machine-readable code, also written to the audit record.
    pub reason_code: &'static str,
    /// Human-readable explanation surfaced back to the host/user.
    pub message: String,
}

impl GuardRejection {
    pub fn new(reason_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            reason_code,
            message: message.into(),
        }
    }
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason_code, self.message)
    }
}

impl std::error::Error for GuardRejection {}

/// What a single hook invocation returned.
pub type HookResult = Result<(), GuardRejection>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejection_displays_code_and_message() {
        let rejection = GuardRejection::new("dangerous_command_blocked", "rm -rf / is blocked");
        assert_eq!(
            rejection.to_string(),
            "dangerous_command_blocked: rm -rf / is blocked"
        );
    }
}
