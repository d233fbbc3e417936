//! Keeps the last known todo-list snapshot per session and re-injects it as
//! a follow-up prompt right after a compaction, since summarization tends
//! to drop the structured task list that isn't part of the prose.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::host_api::{PromptBody, PromptPart};
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct CompactionTodoPreserver {
    metadata: HookMetadata,
    last_todo: SessionRuntimeMap<String>,
}

impl CompactionTodoPreserver {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("compaction-todo-preserver", "Compaction Todo Preserver").with_priority(PRIORITY_LATE),
            last_todo: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for CompactionTodoPreserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for CompactionTodoPreserver {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteAfter, EventType::SessionCompacted]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };

        match ctx.event.event_type {
            EventType::ToolExecuteAfter => {
                let tool = ctx.event.tool_name().unwrap_or("");
                if tool != "todowrite" && tool != "todoread" {
                    return Ok(());
                }
                let Some(snapshot) = ctx.event.output.get("output").and_then(|v| v.as_str()) else {
                    return Ok(());
                };
                self.last_todo.insert(&session_id, snapshot.to_string());
                Ok(())
            }
            EventType::SessionCompacted => {
                let Some(snapshot) = self.last_todo.get(&session_id) else {
                    return Ok(());
                };
                let body = PromptBody {
                    parts: vec![PromptPart::text(format!(
                        "Before this session was compacted, the outstanding todo list was:\n\n{snapshot}"
                    ))],
                    agent: None,
                    model: None,
                };
                match ctx.host().session_prompt_async(&session_id, body).await {
                    Ok(()) => {
                        ctx.audit(
                            &self.metadata.id,
                            crate::audit::AuditStage::Inject,
                            ReasonCode::CompactionTodoRestored.as_str(),
                        );
                    }
                    Err(err) => {
                        tracing::warn!(%session_id, error = %err, "compaction todo restore prompt failed");
                        ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::HostApiError.as_str());
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
