//! Redacts secret-shaped substrings from a tool's post-execution output.
//! Unlike the pre-tool guards, this hook never rejects: it mutates
//! `output.output` in place and audits what it redacted.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_NORMAL};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use regex::Regex;

const REDACTED: &str = "[redacted]";

pub struct SecretLeakGuard {
    metadata: HookMetadata,
}

impl SecretLeakGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("secret-leak-guard", "Secret Leak Guard").with_priority(PRIORITY_NORMAL),
        }
    }
}

impl Default for SecretLeakGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for SecretLeakGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteAfter]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(text) = ctx.event.output.get("output").and_then(|v| v.as_str()) else {
            return Ok(());
        };

        let mut redacted_text = text.to_string();
        let mut matched_any = false;
        for pattern in &ctx.policy().guards.secret_patterns {
            let Ok(re) = Regex::new(pattern) else {
                continue;
            };
            if re.is_match(&redacted_text) {
                matched_any = true;
                redacted_text = re.replace_all(&redacted_text, REDACTED).into_owned();
            }
        }

        if !matched_any {
            return Ok(());
        }

        if let Some(map) = ctx.event.output.as_object_mut() {
            map.insert("output".to_string(), serde_json::Value::String(redacted_text));
        }
        ctx.audit(&self.metadata.id, crate::audit::AuditStage::Inject, ReasonCode::SecretOutputRedacted.as_str());
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
    async fn redacts_matching_secret_in_output() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteAfter)
            .with_output(serde_json::json!({"output": "token: sk-abcdefghijklmnopqrstuvwx"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        SecretLeakGuard::new().execute(&mut ctx).await.unwrap();
        let output = ctx.event.output.get("output").unwrap().as_str().unwrap();
        assert!(!output.contains("sk-abcdefghijklmnopqrstuvwx"));
        assert!(output.contains(REDACTED));
    }

    #[tokio::test]
    async fn leaves_clean_output_untouched() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteAfter)
            .with_output(serde_json::json!({"output": "all good here"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        SecretLeakGuard::new().execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.event.output.get("output").unwrap().as_str().unwrap(), "all good here");
    }
}
