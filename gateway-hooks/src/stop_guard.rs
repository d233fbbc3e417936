//! Abstraction over forcibly stopping an active continuation loop, used by
//! guards that react to external pressure (e.g. critical memory pressure)
//! rather than a user-issued slash command.

use crate::loop_engine::LoopEngine;

pub trait StopGuard: Send + Sync {
    fn force_stop(&self, directory: &str, session_id: &str, reason: &str);
}

/// Production implementation: forwards to [`LoopEngine::stop`]. A directory
/// hosts one active loop at a time, so the session id is accepted for
/// logging/audit symmetry but not matched against the persisted state.
pub struct LoopStopGuard;

impl StopGuard for LoopStopGuard {
    fn force_stop(&self, directory: &str, _session_id: &str, reason: &str) {
        if let Err(err) = LoopEngine::stop(directory, reason) {
            tracing::warn!(%directory, %reason, error = %err, "force_stop failed to persist");
        }
    }
}

#[cfg(test)]
pub use test_support::FakeStopGuard;
