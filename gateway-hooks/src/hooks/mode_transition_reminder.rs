//! Same cooldown-gated reminder shape as [`super::plan_handoff_reminder`],
//! nudging the agent to reassess whether it should switch between build and
//! review modes.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

const REMINDER_TEXT: &str = "\n\nConsider whether it's time to switch modes (build vs. review) before continuing.";

pub struct ModeTransitionReminder {
    metadata: HookMetadata,
    calls_since_last: SessionRuntimeMap<u32>,
}

impl ModeTransitionReminder {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("mode-transition-reminder", "Mode Transition Reminder").with_priority(PRIORITY_LATE),
            calls_since_last: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for ModeTransitionReminder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for ModeTransitionReminder {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteAfter]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };
        let cooldown = ctx.policy().advisory.mode_transition_reminder.cooldown_tool_calls;
        let calls = self.calls_since_last.get(&session_id).unwrap_or(0) + 1;

        if calls < cooldown {
            self.calls_since_last.insert(&session_id, calls);
            return Ok(());
        }
        self.calls_since_last.insert(&session_id, 0);

        let output = ctx.event.output.get("output").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let appended = format!("{output}{REMINDER_TEXT}");
        if let Some(map) = ctx.event.output.as_object_mut() {
            map.insert("output".to_string(), serde_json::Value::String(appended));
        }
        ctx.audit(
            &self.metadata.id,
            crate::audit::AuditStage::Inject,
            ReasonCode::ModeTransitionReminderAppended.as_str(),
        );
        Ok(())
    }
}
