//! Blocks a direct `git commit`/`git push` against a protected branch
//! (`main`, `master`, ...). Current branch is host-populated on
//! `input.currentBranch`.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct WorkflowConformanceGuard {
    metadata: HookMetadata,
}

impl WorkflowConformanceGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("workflow-conformance-guard", "Workflow Conformance Guard")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for WorkflowConformanceGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn is_direct_write(command: &str) -> bool {
    command.contains("git commit") || command.contains("git push")
}

#[async_trait]
impl Hook for WorkflowConformanceGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(command) = ctx.event.command_text() else {
            return Ok(());
        };
        if !is_direct_write(command) {
            return Ok(());
        }

        let Some(current_branch) = ctx.event.input.get("currentBranch").and_then(|v| v.as_str()) else {
            return Ok(());
        };

        if ctx
            .policy()
            .guards
            .workflow_conformance
            .protected_branches
            .iter()
            .any(|b| b == current_branch)
        {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::WorkflowConformanceBlocked.as_str(),
                format!("direct write to protected branch `{current_branch}`"),
            ));
        }
        Ok(())
    }
}
