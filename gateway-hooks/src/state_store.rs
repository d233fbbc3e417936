//! Atomic read/write of the per-directory persisted [`GatewayState`].

use chrono::Utc;
use gateway_protocol::GatewayState;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupReason {
    StateMissing,
    NotActive,
    WithinAgeLimit,
    InvalidStartedAt,
    StaleLoopDeactivated,
}

impl CleanupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupReason::StateMissing => "state_missing",
            CleanupReason::NotActive => "not_active",
            CleanupReason::WithinAgeLimit => "within_age_limit",
            CleanupReason::InvalidStartedAt => "invalid_started_at",
            CleanupReason::StaleLoopDeactivated => "stale_loop_deactivated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub changed: bool,
    pub reason: CleanupReason,
}

#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("io error persisting gateway state: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize gateway state: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct StateStore;

impl StateStore {
    pub fn state_path(directory: &str) -> PathBuf {
        Path::new(directory).join(".opencode").join("state.json")
    }

    /// Missing file returns `None`; unparseable file also returns `None`
    /// and is left on disk untouched.
    pub fn load(directory: &str) -> Option<GatewayState> {
        let path = Self::state_path(directory);
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Write-temp-then-rename so concurrent readers only ever see a
    /// complete pre- or post-image.
    pub fn save(directory: &str, state: &GatewayState) -> Result<(), StateStoreError> {
        let path = Self::state_path(directory);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Deactivate a loop whose `started_at` age exceeds `max_age_hours`.
    pub fn cleanup_orphan(directory: &str, max_age_hours: i64) -> CleanupOutcome {
        let Some(mut state) = Self::load(directory) else {
            return CleanupOutcome {
                changed: false,
                reason: CleanupReason::StateMissing,
            };
        };
        let Some(active_loop) = state.active_loop.as_mut() else {
            return CleanupOutcome {
                changed: false,
                reason: CleanupReason::NotActive,
            };
        };
        if !active_loop.active {
            return CleanupOutcome {
                changed: false,
                reason: CleanupReason::NotActive,
            };
        }

        let now = Utc::now();
        let age = now.signed_duration_since(active_loop.started_at);
        if age < chrono::Duration::hours(max_age_hours) {
            return CleanupOutcome {
                changed: false,
                reason: CleanupReason::WithinAgeLimit,
            };
        }

        active_loop.active = false;
        state.last_updated_at = Some(now);
        state.source = Some("stale_loop_deactivated".to_string());
        if Self::save(directory, &state).is_err() {
            return CleanupOutcome {
                changed: false,
                reason: CleanupReason::InvalidStartedAt,
            };
        }
        CleanupOutcome {
            changed: true,
            reason: CleanupReason::StaleLoopDeactivated,
        }
    }
}
