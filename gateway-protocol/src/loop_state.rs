//! Persisted continuation-loop state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the loop decides the objective has been met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// A literal sentinel string in the assistant's last message.
    Promise,
    /// Evaluated externally, by the host runtime file.
    Objective,
}

impl Default for CompletionMode {
    fn default() -> Self {
        CompletionMode::Promise
    }
}

pub const DEFAULT_COMPLETION_PROMISE: &str = "DONE";

/// The persisted autonomous continuation objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveLoop {
    pub active: bool,
    pub session_id: String,
    pub objective: String,
    #[serde(default)]
    pub done_criteria: Vec<String>,
    pub completion_mode: CompletionMode,
    pub completion_promise: String,
    pub iteration: u64,
    /// 0 means unbounded.
    pub max_iterations: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ignored_completion_cycles: u64,
}

impl ActiveLoop {
    pub fn start(
        session_id: impl Into<String>,
        objective: impl Into<String>,
        done_criteria: Vec<String>,
        completion_mode: CompletionMode,
        completion_promise: Option<String>,
        max_iterations: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            active: true,
            session_id: session_id.into(),
            objective: objective.into(),
            done_criteria,
            completion_mode,
            completion_promise: completion_promise
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_COMPLETION_PROMISE.to_string()),
            iteration: 1,
            max_iterations,
            started_at,
            ignored_completion_cycles: 0,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_iterations == 0
    }

    pub fn exceeded_max_iterations(&self) -> bool {
        !self.is_unbounded() && self.iteration > self.max_iterations
    }
}

/// The whole-file persisted gateway state for one working directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_loop: Option<ActiveLoop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl GatewayState {
    pub fn with_loop(active_loop: ActiveLoop, now: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            active_loop: Some(active_loop),
            last_updated_at: Some(now),
            source: Some(source.into()),
        }
    }
}
