//! Optionally blocks `todowrite`/`todoread` entirely, for hosts that run
//! their own task tracking and don't want the model's todo list competing
//! with it. Off by default; a no-op unless explicitly enabled in policy.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct TasksTodowriteDisabler {
    metadata: HookMetadata,
}

impl TasksTodowriteDisabler {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("tasks-todowrite-disabler", "Tasks Todowrite Disabler")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for TasksTodowriteDisabler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for TasksTodowriteDisabler {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        if !ctx.policy().guards.tasks_todowrite_disabler.enabled {
            return Ok(());
        }
        let Some(tool) = ctx.event.tool_name() else {
            return Ok(());
        };
        if tool != "todowrite" && tool != "todoread" {
            return Ok(());
        }

        Err(ctx.reject(
            &self.metadata.id,
            ReasonCode::TasksTodowriteDisabled.as_str(),
            "todowrite/todoread is disabled by policy",
        ))
    }
}
