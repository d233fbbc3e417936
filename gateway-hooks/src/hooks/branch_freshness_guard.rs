//! Blocks `gh pr create`/`gh pr merge` while the current branch has fallen
//! too far behind its base. Git/gh invocation is an opaque subprocess
//! adapter out of scope for this crate: the host is expected to populate
//! `input.behindCount` and `input.baseRefExists` before dispatch, the same
//! way `secret-commit-guard` reads a pre-computed `stagedDiff`.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct BranchFreshnessGuard {
    metadata: HookMetadata,
}

impl BranchFreshnessGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("branch-freshness-guard", "Branch Freshness Guard").with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for BranchFreshnessGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn is_pr_create_or_merge(command: &str) -> bool {
    command.contains("gh pr create") || command.contains("gh pr merge")
}

#[async_trait]
impl Hook for BranchFreshnessGuard {
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
        if !is_pr_create_or_merge(command) {
            return Ok(());
        }

        let base_ref_exists = ctx
            .event
            .input
            .get("baseRefExists")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !base_ref_exists {
            return Ok(());
        }

        let Some(behind_count) = ctx.event.input.get("behindCount").and_then(|v| v.as_u64()) else {
            return Ok(());
        };

        let max_behind = ctx.policy().guards.branch_freshness.max_behind as u64;
        if behind_count > max_behind {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::BranchStaleBlocked.as_str(),
                format!("branch is {behind_count} commits behind base, exceeds max of {max_behind}"),
            ));
        }
        Ok(())
    }
}
