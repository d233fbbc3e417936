//! Drains the pending-context collector into the next outbound message.
//!
//! `chat.message` carries a `parts` array hooks can rewrite directly via
//! [`inject_text_prefix`]; the transform event instead exposes a raw
//! `messages` array that must be walked by hand so the two distinct
//! failure modes (no user message at all vs. a user message with no
//! `parts` array) get their own audit reason codes instead of collapsing
//! into one.
//!
//! `session.deleted` clears the session's bucket; `session.compacted`
//! deliberately does not, since a compaction is not the same as a session
//! going away and pending context should survive it.

use crate::collector::RegisterRequest;
use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::injection::{inject_text_prefix, InjectionOutcome};
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_NORMAL};
use async_trait::async_trait;
use gateway_protocol::{EventType, Priority, ReasonCode, TextPart};

pub struct ContextInjector {
    metadata: HookMetadata,
}

impl ContextInjector {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("context-injector", "Context Injector").with_priority(PRIORITY_NORMAL),
        }
    }
}

impl Default for ContextInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextInjector {
    fn handle_chat_message(&self, ctx: &mut HookContext<'_>, session_id: &str) {
        let pending = ctx.collector().consume(session_id);
        if !pending.has_content {
            return;
        }
        let max_chars = ctx.policy().collector.max_chars;

        let mut parts: Vec<TextPart> = match ctx.event.output.get("parts") {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
            None => Vec::new(),
        };

        let (outcome, applied) = inject_text_prefix(&mut parts, &pending.merged, max_chars);
        match outcome {
            InjectionOutcome::Injected => {
                if let Some(map) = ctx.event.output.as_object_mut() {
                    map.insert("parts".to_string(), serde_json::to_value(&parts).unwrap_or_default());
                }
                let before = pending.merged.chars().count();
                let after = applied.chars().count();
                let reason = if after < before {
                    ReasonCode::ContextTruncatedChat
                } else {
                    ReasonCode::ContextInjectChat
                };
                let mut record = crate::audit::AuditRecord::new(
                    &self.metadata.id,
                    crate::audit::AuditStage::Inject,
                    reason.as_str(),
                );
                if matches!(reason, ReasonCode::ContextTruncatedChat) {
                    record = record
                        .with_field("context_length_before", before as i64)
                        .with_field("context_length_after", after as i64);
                }
                ctx.audit_with(record);
            }
            InjectionOutcome::NoTextPart => {
                ctx.collector().register(
                    session_id,
                    RegisterRequest {
                        source: "context-injector-requeue".to_string(),
                        id: "chat-message-fallback".to_string(),
                        content: pending.merged.clone(),
                        priority: Priority::High,
                        metadata: None,
                    },
                );
                ctx.audit(
                    &self.metadata.id,
                    crate::audit::AuditStage::Skip,
                    ReasonCode::ContextRequeuedNoTextPart.as_str(),
                );
            }
        }
    }

    fn handle_transform(&self, ctx: &mut HookContext<'_>, session_id: &str) {
        let pending = ctx.collector().consume(session_id);
        if !pending.has_content {
            return;
        }
        let max_chars = ctx.policy().collector.max_chars;
        let truncated = crate::injection::truncate_with_marker(&pending.merged, max_chars);

        let Some(messages) = ctx.event.output.get_mut("messages").and_then(|v| v.as_array_mut()) else {
            ctx.audit(
                &self.metadata.id,
                crate::audit::AuditStage::Skip,
                ReasonCode::PendingContextTransformNoUserMessage.as_str(),
            );
            return;
        };

        let Some(message) = messages.iter_mut().rev().find(|m| {
            m.get("info").and_then(|i| i.get("role")).and_then(|r| r.as_str()) == Some("user")
        }) else {
            ctx.audit(
                &self.metadata.id,
                crate::audit::AuditStage::Skip,
                ReasonCode::PendingContextTransformNoUserMessage.as_str(),
            );
            return;
        };

        let Some(parts) = message.get_mut("parts").and_then(|p| p.as_array_mut()) else {
            ctx.audit(
                &self.metadata.id,
                crate::audit::AuditStage::Skip,
                ReasonCode::PendingContextTransformMissingParts.as_str(),
            );
            return;
        };

        let synthetic = serde_json::to_value(TextPart::synthetic(truncated.clone()))
            .unwrap_or_else(|_| serde_json::json!({"type": "text", "text": truncated, "synthetic": true}));
        parts.insert(0, synthetic);

        let before = pending.merged.chars().count();
        let after = truncated.chars().count();
        let reason = if after < before {
            ReasonCode::ContextTruncatedTransform
        } else {
            ReasonCode::ContextInjectTransform
        };
        let mut record = crate::audit::AuditRecord::new(
            &self.metadata.id,
            crate::audit::AuditStage::Inject,
            reason.as_str(),
        );
        if matches!(reason, ReasonCode::ContextTruncatedTransform) {
            record = record
                .with_field("context_length_before", before as i64)
                .with_field("context_length_after", after as i64);
        }
        ctx.audit_with(record);
    }
}

#[async_trait]
impl Hook for ContextInjector {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[
            EventType::ChatMessage,
            EventType::ExperimentalChatMessagesTransform,
            EventType::SessionDeleted,
        ]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };

        match ctx.event.event_type {
            EventType::ChatMessage => self.handle_chat_message(ctx, &session_id),
            EventType::ExperimentalChatMessagesTransform => self.handle_transform(ctx, &session_id),
            EventType::SessionDeleted => ctx.collector().clear(&session_id),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditSink;
    use crate::collector::RegisterRequest;
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
    async fn injects_pending_context_into_chat_message() {
        let runtime = runtime();
        runtime.collector.register(
            "s1",
            RegisterRequest {
                source: "test".to_string(),
                id: "1".to_string(),
                content: "pending note".to_string(),
                priority: gateway_protocol::Priority::Normal,
                metadata: None,
            },
        );
        let mut event = Event::new("/tmp", EventType::ChatMessage)
            .with_input(serde_json::json!({"sessionID": "s1"}))
            .with_output(serde_json::json!({"parts": [{"type": "text", "text": "hello"}]}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ContextInjector::new().execute(&mut ctx).await.unwrap();
        let parts = ctx.event.output.get("parts").unwrap().as_array().unwrap();
        assert!(parts[0]["text"].as_str().unwrap().contains("pending note"));
        assert!(!runtime.collector.has_pending("s1"));
    }

    #[tokio::test]
    async fn requeues_when_chat_message_has_no_text_part() {
        let runtime = runtime();
        runtime.collector.register(
            "s1",
            RegisterRequest {
                source: "test".to_string(),
                id: "1".to_string(),
                content: "pending note".to_string(),
                priority: gateway_protocol::Priority::Normal,
                metadata: None,
            },
        );
        let mut event = Event::new("/tmp", EventType::ChatMessage)
            .with_input(serde_json::json!({"sessionID": "s1"}))
            .with_output(serde_json::json!({"parts": []}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ContextInjector::new().execute(&mut ctx).await.unwrap();
        assert!(runtime.collector.has_pending("s1"));
    }

    #[tokio::test]
    async fn injects_into_last_user_message_on_transform() {
        let runtime = runtime();
        runtime.collector.register(
            "s1",
            RegisterRequest {
                source: "test".to_string(),
                id: "1".to_string(),
                content: "merged context".to_string(),
                priority: gateway_protocol::Priority::Normal,
                metadata: None,
            },
        );
        let mut event = Event::new("/tmp", EventType::ExperimentalChatMessagesTransform).with_output(serde_json::json!({
            "messages": [
                {"info": {"role": "assistant", "sessionID": "s1"}, "parts": []},
                {"info": {"role": "user", "sessionID": "s1"}, "parts": [{"type": "text", "text": "hi"}]},
            ]
        }));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ContextInjector::new().execute(&mut ctx).await.unwrap();
        let parts = ctx.event.output["messages"][1]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "merged context");
    }

    #[tokio::test]
    async fn missing_parts_array_on_transform_is_reported_distinctly() {
        let runtime = runtime();
        runtime.collector.register(
            "s1",
            RegisterRequest {
                source: "test".to_string(),
                id: "1".to_string(),
                content: "merged context".to_string(),
                priority: gateway_protocol::Priority::Normal,
                metadata: None,
            },
        );
        let mut event = Event::new("/tmp", EventType::ExperimentalChatMessagesTransform).with_output(serde_json::json!({
            "messages": [
                {"info": {"role": "user", "sessionID": "s1"}},
            ]
        }));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = ContextInjector::new().execute(&mut ctx).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn session_deleted_clears_pending_context() {
        let runtime = runtime();
        runtime.collector.register(
            "s1",
            RegisterRequest {
                source: "test".to_string(),
                id: "1".to_string(),
                content: "leftover".to_string(),
                priority: gateway_protocol::Priority::Normal,
                metadata: None,
            },
        );
        let mut event = Event::new("/tmp", EventType::SessionDeleted).with_input(serde_json::json!({"sessionID": "s1"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ContextInjector::new().execute(&mut ctx).await.unwrap();
        assert!(!runtime.collector.has_pending("s1"));
    }
}
