//! Triggers a proactive summarization once a session's token usage passes
//! the critical threshold and is large enough to be worth compacting,
//! rather than waiting for the host to hit its own hard limit.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct PreemptiveCompaction {
    metadata: HookMetadata,
    triggered: SessionRuntimeMap<bool>,
}

impl PreemptiveCompaction {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("preemptive-compaction", "Preemptive Compaction").with_priority(PRIORITY_LATE),
            triggered: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for PreemptiveCompaction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for PreemptiveCompaction {
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
        let Some(tokens_used) = ctx.event.input.get("tokensUsed").and_then(|v| v.as_u64()) else {
            return Ok(());
        };
        let Some(context_window) = ctx.event.input.get("contextWindow").and_then(|v| v.as_u64()) else {
            return Ok(());
        };
        if context_window == 0 {
            return Ok(());
        }

        let policy = ctx.policy().context_monitor.clone();
        if tokens_used < policy.min_tokens_for_compaction {
            return Ok(());
        }
        let fraction = tokens_used as f64 / context_window as f64;
        if fraction < policy.critical_threshold {
            self.triggered.remove(&session_id);
            return Ok(());
        }
        if self.triggered.get(&session_id).unwrap_or(false) {
            return Ok(());
        }

        match ctx.host().session_summarize(&session_id).await {
            Ok(()) => {
                self.triggered.insert(&session_id, true);
                ctx.audit(
                    &self.metadata.id,
                    crate::audit::AuditStage::State,
                    ReasonCode::PreemptiveCompactionTriggered.as_str(),
                );
            }
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "preemptive compaction summarize call failed");
            }
        }
        Ok(())
    }
}
