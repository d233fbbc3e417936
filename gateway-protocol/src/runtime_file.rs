//! Read-only schema for the host-written `autopilot_runtime.json` file.

use serde::{Deserialize, Serialize};

/// Coarse runtime lifecycle status as reported by the autopilot runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    Running,
    Completed,
    BudgetStopped,
    Failed,
    Cancelled,
}

impl RuntimeStatus {
    /// A terminal status means a promise token should be honored rather
    /// than counted as an ignored completion cycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RuntimeStatus::Running)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeObjective {
    #[serde(default)]
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_promise: Option<String>,
    #[serde(default)]
    pub done_criteria: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeProgress {
    #[serde(default)]
    pub completed_cycles: u64,
    #[serde(default)]
    pub pending_cycles: u64,
}

/// The full contents of the host-written runtime-status file. The gateway
/// only ever reads this file; the host/CLI owns writing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutopilotRuntimeFile {
    pub status: RuntimeStatus,
    #[serde(default)]
    pub objective: RuntimeObjective,
    #[serde(default)]
    pub progress: RuntimeProgress,
    #[serde(default)]
    pub blockers: Vec<String>,
}

impl AutopilotRuntimeFile {
    /// Whether a promise-token observation should be treated as an ignored
    /// completion cycle: the runtime is still running and reports either
    /// outstanding blockers or pending cycles.
    pub fn is_runtime_incomplete(&self) -> bool {
        !self.status.is_terminal()
            && (!self.blockers.is_empty() || self.progress.pending_cycles > 0)
    }
}
