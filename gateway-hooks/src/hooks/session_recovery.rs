//! Reprompts a session after a recoverable `session.error`, preserving the
//! agent/model identity the session was using so the retry doesn't silently
//! fall back to a default.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::host_api::{PromptBody, PromptPart};
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use regex::Regex;

pub struct SessionRecovery {
    metadata: HookMetadata,
}

impl SessionRecovery {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("session-recovery", "Session Recovery").with_priority(PRIORITY_LATE),
        }
    }
}

impl Default for SessionRecovery {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_recoverable(patterns: &[String], message: &str) -> bool {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).any(|re| re.is_match(message))
}

#[async_trait]
impl Hook for SessionRecovery {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::SessionError]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };
        let Some(message) = ctx.event.input.get("error").and_then(|v| v.as_str()) else {
            return Ok(());
        };
        let patterns = ctx.policy().advisory.session_recovery.recoverable_patterns.clone();
        if !matches_recoverable(&patterns, message) {
            return Ok(());
        }

        let messages = match ctx.host().session_messages(&session_id).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "session recovery failed to read session messages");
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::HostApiError.as_str());
                return Ok(());
            }
        };
        let (agent, model) = messages
            .last()
            .map(|m| (m.info.agent.clone(), m.info.model.clone()))
            .unwrap_or((None, None));

        let body = PromptBody {
            parts: vec![PromptPart::text(
                "The previous turn failed due to a recoverable error. Please retry the last step.",
            )],
            agent,
            model,
        };

        match ctx.host().session_prompt_async(&session_id, body).await {
            Ok(()) => {
                ctx.audit(
                    &self.metadata.id,
                    crate::audit::AuditStage::State,
                    ReasonCode::SessionRecoveryReprompted.as_str(),
                );
            }
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "session recovery reprompt failed");
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::HostApiError.as_str());
            }
        }
        Ok(())
    }
}
