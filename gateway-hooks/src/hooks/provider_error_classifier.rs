//! Classifies `session.error` messages into retryable/context-overflow/
//! non-retryable buckets and records the verdict. Purely observational: it
//! never rejects or rewrites anything, it just gives downstream hooks and
//! the audit trail a stable category to key off of.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::provider_error::classify_provider_retry_reason;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct ProviderErrorClassifier {
    metadata: HookMetadata,
}

impl ProviderErrorClassifier {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("provider-error-classifier", "Provider Error Classifier").with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for ProviderErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for ProviderErrorClassifier {
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
        let category = classify_provider_retry_reason(message);
        ctx.audit_with(
            crate::audit::AuditRecord::new(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::ProviderErrorClassified.as_str())
                .with_field("category", serde_json::json!(category.as_str())),
        );
        Ok(())
    }
}
