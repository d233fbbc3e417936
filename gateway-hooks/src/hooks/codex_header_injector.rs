//! Injects a one-time environment header into the first chat message of a
//! session whose active model matches one of `model_patterns` (codex-style
//! models expect an explicit environment banner the other providers don't).
//! Looks up the session's last message via [`HostApi::session_messages`]
//! rather than trusting anything client-supplied, since the model identity
//! isn't otherwise present on a `chat.message` event's `input`.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::injection::inject_text_prefix;
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode, TextPart};
use regex::Regex;

pub struct CodexHeaderInjector {
    metadata: HookMetadata,
    injected: SessionRuntimeMap<bool>,
}

impl CodexHeaderInjector {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("codex-header-injector", "Codex Header Injector").with_priority(PRIORITY_EARLY),
            injected: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for CodexHeaderInjector {
    fn default() -> Self {
        Self::new()
    }
}

fn model_matches(patterns: &[String], model: &str) -> bool {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).any(|re| re.is_match(model))
}

#[async_trait]
impl Hook for CodexHeaderInjector {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ChatMessage]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };
        if self.injected.get(&session_id).unwrap_or(false) {
            return Ok(());
        }

        let messages = match ctx.host().session_messages(&session_id).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "codex header injector failed to read session messages");
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::HostApiError.as_str());
                return Ok(());
            }
        };
        let Some(last) = messages.last() else {
            return Ok(());
        };
        let model = last
            .info
            .model
            .as_deref()
            .or(last.info.model_id.as_deref())
            .unwrap_or("");
        if model.is_empty() {
            return Ok(());
        }

        let policy = ctx.policy().advisory.codex_header_injector.clone();
        if !model_matches(&policy.model_patterns, model) {
            return Ok(());
        }

        let mut parts: Vec<TextPart> = match ctx.event.output.get("parts") {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
            None => Vec::new(),
        };
        let (outcome, _) = inject_text_prefix(&mut parts, &policy.header, usize::MAX);
        if outcome != crate::injection::InjectionOutcome::Injected {
            return Ok(());
        }
        if let Some(map) = ctx.event.output.as_object_mut() {
            map.insert("parts".to_string(), serde_json::to_value(&parts).unwrap_or_default());
        }
        self.injected.insert(&session_id, true);
        ctx.audit(&self.metadata.id, crate::audit::AuditStage::Inject, ReasonCode::CodexHeaderInjected.as_str());
        Ok(())
    }
}
