//! Marks a session "stopped" the moment a `/autopilot stop|pause` (or
//! legacy alias) command is issued, and refuses the next `session.idle`
//! re-prompt for that session even if the persisted loop state hasn't
//! caught up yet. The mark clears on the session's next chat message so a
//! fresh `/autopilot go` isn't blocked by a stale stop.
//!
//! Runs ahead of `continuation` in dispatch order so a stop issued in the
//! same turn always wins the race against an in-flight re-prompt.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::slash_command::{self, resolve_autopilot_action, AutopilotAction};
use crate::types::{HookMetadata, PRIORITY_FIRST};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct StopContinuationGuard {
    metadata: HookMetadata,
    stopped: SessionRuntimeMap<bool>,
}

impl StopContinuationGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("stop-continuation-guard", "Stop Continuation Guard").with_priority(PRIORITY_FIRST),
            stopped: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for StopContinuationGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn is_stop_command(raw: &str) -> bool {
    let parsed = slash_command::parse_slash_command(raw).or_else(|| slash_command::parse_autopilot_template_command(raw));
    let Some(parsed) = parsed else {
        return false;
    };
    resolve_autopilot_action(&parsed.name, &parsed.args) == AutopilotAction::Stop
}

#[async_trait]
impl Hook for StopContinuationGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[
            EventType::CommandExecuteBefore,
            EventType::ToolExecuteBefore,
            EventType::ChatMessage,
            EventType::SessionIdle,
        ]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };

        match ctx.event.event_type {
            EventType::CommandExecuteBefore | EventType::ToolExecuteBefore => {
                if let Some(command) = ctx.event.command_text() {
                    if is_stop_command(command) {
                        self.stopped.insert(&session_id, true);
                    }
                }
                Ok(())
            }
            EventType::ChatMessage => {
                self.stopped.remove(&session_id);
                Ok(())
            }
            EventType::SessionIdle => {
                if self.stopped.get(&session_id).unwrap_or(false) {
                    return Err(ctx.reject(
                        &self.metadata.id,
                        ReasonCode::ContinuationBlockedByStop.as_str(),
                        "continuation loop was just stopped for this session",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
