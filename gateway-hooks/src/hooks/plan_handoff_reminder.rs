//! Nudges the agent to hand off to plan mode after enough tool calls have
//! passed without one, mirroring the cadence reminders the other advisory
//! hooks in this module use.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

const REMINDER_TEXT: &str = "\n\nConsider handing off to plan mode before making further changes.";

pub struct PlanHandoffReminder {
    metadata: HookMetadata,
    calls_since_last: SessionRuntimeMap<u32>,
}

impl PlanHandoffReminder {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("plan-handoff-reminder", "Plan Handoff Reminder").with_priority(PRIORITY_LATE),
            calls_since_last: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for PlanHandoffReminder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for PlanHandoffReminder {
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
        let cooldown = ctx.policy().advisory.plan_handoff_reminder.cooldown_tool_calls;
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
        ctx.audit(&self.metadata.id, crate::audit::AuditStage::Inject, ReasonCode::PlanHandoffReminderAppended.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditSink;
    use crate::context::GatewayRuntime;
    use crate::host_api::FakeHostApi;
    use crate::policy::Policy;
    use gateway_protocol::Event;
    use std::sync::Arc;

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
    }

    #[tokio::test]
    async fn reminds_once_cooldown_elapses() {
        let runtime = runtime();
        let hook = PlanHandoffReminder::new();
        let cooldown = runtime.policy.advisory.plan_handoff_reminder.cooldown_tool_calls;
        let mut last_output = String::new();
        for _ in 0..cooldown {
            let mut event = Event::new("/tmp", EventType::ToolExecuteAfter)
                .with_input(serde_json::json!({"sessionID": "s1"}))
                .with_output(serde_json::json!({"output": "ran"}));
            let mut ctx = HookContext::new(&mut event, &runtime);
            hook.execute(&mut ctx).await.unwrap();
            last_output = ctx.event.output.get("output").unwrap().as_str().unwrap().to_string();
        }
        assert!(last_output.contains("plan mode"));
    }

    #[tokio::test]
    async fn stays_silent_before_cooldown_elapses() {
        let runtime = runtime();
        let hook = PlanHandoffReminder::new();
        let mut event = Event::new("/tmp", EventType::ToolExecuteAfter)
            .with_input(serde_json::json!({"sessionID": "s1"}))
            .with_output(serde_json::json!({"output": "ran"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        hook.execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.event.output.get("output").unwrap().as_str().unwrap(), "ran");
    }
}
