//! Drives the continuation loop's `session.idle` re-prompt cycle. All the
//! state machine logic lives in [`crate::loop_engine::LoopEngine`]; this
//! hook is a thin adapter translating its outcome into an audit record.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::loop_engine::{IdleOutcome, LoopEngine};
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_NORMAL};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct Continuation {
    metadata: HookMetadata,
}

impl Continuation {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("continuation", "Continuation").with_priority(PRIORITY_NORMAL),
        }
    }
}

impl Default for Continuation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for Continuation {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::SessionIdle]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };

        let directory = ctx.directory().to_string();
        let policy = ctx.policy().loop_policy.clone();
        let collector = ctx.collector();
        let host = ctx.host();

        match LoopEngine::on_session_idle(&directory, &session_id, &policy, collector, host).await {
            Ok(outcome) => {
                let reason = match outcome {
                    IdleOutcome::NoActiveLoop | IdleOutcome::SessionMismatch => return Ok(()),
                    IdleOutcome::Advanced { .. } => ReasonCode::LoopIterationAdvanced,
                    IdleOutcome::StalledDeactivated => ReasonCode::LoopStalledDeactivated,
                    IdleOutcome::MaxIterationsReached => ReasonCode::LoopMaxIterationsReached,
                    IdleOutcome::Completed => ReasonCode::LoopStopped,
                };
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, reason.as_str());
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "continuation on_session_idle failed");
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::Skip, ReasonCode::HostApiError.as_str());
                Ok(())
            }
        }
    }
}
