//! Blocks an `ask`/question tool from a subagent session: subagents run
//! unattended and have no user to answer them. A session id matching
//! `guards.subagent_question_blocker.session_pattern` identifies a subagent.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use regex::Regex;

pub struct SubagentQuestionBlocker {
    metadata: HookMetadata,
}

impl SubagentQuestionBlocker {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("subagent-question-blocker", "Subagent Question Blocker")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for SubagentQuestionBlocker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for SubagentQuestionBlocker {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(tool) = ctx.event.tool_name() else {
            return Ok(());
        };
        if tool != "ask" && tool != "question" {
            return Ok(());
        }

        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };
        let pattern = ctx.policy().guards.subagent_question_blocker.session_pattern.clone();
        let Ok(re) = Regex::new(&pattern) else {
            return Ok(());
        };
        if !re.is_match(&session_id) {
            return Ok(());
        }

        Err(ctx.reject(
            &self.metadata.id,
            ReasonCode::SubagentQuestionBlocked.as_str(),
            "subagent sessions cannot ask the user a question",
        ))
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
    async fn blocks_question_from_subagent_session() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "ask", "sessionID": "sess-1-subagent-2"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = SubagentQuestionBlocker::new().execute(&mut ctx).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn allows_question_from_main_session() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "ask", "sessionID": "sess-1"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = SubagentQuestionBlocker::new().execute(&mut ctx).await;
        assert!(result.is_ok());
    }
}
