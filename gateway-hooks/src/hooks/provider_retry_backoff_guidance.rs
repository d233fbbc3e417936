//! Computes a retry delay for retryable `session.error` events and appends
//! it to the output, so the host has a concrete number to wait on instead
//! of guessing. Context-overflow and non-retryable errors are left alone:
//! retrying either wastes a call or repeats the same failure.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::provider_error::{classify_provider_retry_reason, ProviderErrorCategory};
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

const BASE_BACKOFF_MS: u64 = 1_000;

pub struct ProviderRetryBackoffGuidance {
    metadata: HookMetadata,
    attempts: SessionRuntimeMap<u32>,
}

impl ProviderRetryBackoffGuidance {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("provider-retry-backoff-guidance", "Provider Retry Backoff Guidance")
                .with_priority(PRIORITY_EARLY),
            attempts: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for ProviderRetryBackoffGuidance {
    fn default() -> Self {
        Self::new()
    }
}

fn exponential_backoff_ms(attempt: u32, max_backoff_ms: u64) -> u64 {
    let scaled = BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.min(20));
    scaled.min(max_backoff_ms)
}

#[async_trait]
impl Hook for ProviderRetryBackoffGuidance {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::SessionError]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(message) = ctx.event.input.get("error").and_then(|v| v.as_str()) else {
            return Ok(());
        };
        if classify_provider_retry_reason(message) != ProviderErrorCategory::Retryable {
            return Ok(());
        }
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };

        let max_backoff_ms = ctx.policy().provider_retry.max_backoff_ms;
        let delay_ms = match ctx.event.input.get("retryAfterMs").and_then(|v| v.as_u64()) {
            Some(hint) => hint.min(max_backoff_ms),
            None => {
                let attempt = self.attempts.get(&session_id).unwrap_or(0);
                self.attempts.insert(&session_id, attempt + 1);
                exponential_backoff_ms(attempt, max_backoff_ms)
            }
        };

        if let Some(map) = ctx.event.output.as_object_mut() {
            map.insert("retryDelayMs".to_string(), serde_json::json!(delay_ms));
        } else {
            ctx.event.output = serde_json::json!({"retryDelayMs": delay_ms});
        }

        ctx.audit_with(
            crate::audit::AuditRecord::new(
                &self.metadata.id,
                crate::audit::AuditStage::State,
                ReasonCode::ProviderRetryBackoffComputed.as_str(),
            )
            .with_field("delay_ms", serde_json::json!(delay_ms)),
        );
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
    async fn computes_backoff_for_retryable_error() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::SessionError)
            .with_input(serde_json::json!({"sessionID": "s1", "error": "503 overloaded"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ProviderRetryBackoffGuidance::new().execute(&mut ctx).await.unwrap();
        assert!(ctx.event.output.get("retryDelayMs").unwrap().as_u64().unwrap() >= BASE_BACKOFF_MS);
    }

    #[tokio::test]
    async fn suppressed_for_context_overflow() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::SessionError)
            .with_input(serde_json::json!({"sessionID": "s1", "error": "maximum context length exceeded"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ProviderRetryBackoffGuidance::new().execute(&mut ctx).await.unwrap();
        assert!(ctx.event.output.get("retryDelayMs").is_none());
    }

    #[tokio::test]
    async fn honors_retry_after_hint() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::SessionError)
            .with_input(serde_json::json!({"sessionID": "s1", "error": "rate limit", "retryAfterMs": 5_000}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        ProviderRetryBackoffGuidance::new().execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.event.output.get("retryDelayMs").unwrap().as_u64().unwrap(), 5_000);
    }
}
