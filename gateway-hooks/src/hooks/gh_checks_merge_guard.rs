//! Blocks `gh pr merge` unless the PR is approved, non-draft, and has no
//! pending checks. The host populates `input.prIsDraft`/`input.approved`/
//! `input.checksPending`/`input.mergeBlocked` ahead of dispatch; when the
//! essential fields are absent the hook falls back to
//! `guards.fail_open_on_error` rather than guessing.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct GhChecksMergeGuard {
    metadata: HookMetadata,
}

impl GhChecksMergeGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("gh-checks-merge-guard", "GH Checks Merge Guard").with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for GhChecksMergeGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for GhChecksMergeGuard {
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
        if !command.contains("gh pr merge") {
            return Ok(());
        }

        let policy = ctx.policy().guards.gh_checks_merge.clone();
        let is_draft = ctx.event.input.get("prIsDraft").and_then(|v| v.as_bool());
        let approved = ctx.event.input.get("approved").and_then(|v| v.as_bool());

        let (is_draft, approved) = match (is_draft, approved) {
            (Some(d), Some(a)) => (d, a),
            _ => {
                if ctx.policy().guards.fail_open_on_error {
                    ctx.audit(&self.metadata.id, crate::audit::AuditStage::Skip, ReasonCode::PrBodyUninspectable.as_str());
                    return Ok(());
                }
                return Err(ctx.reject(
                    &self.metadata.id,
                    ReasonCode::GhChecksMergeBlocked.as_str(),
                    "PR draft/approval status unavailable, refusing to merge",
                ));
            }
        };

        if is_draft {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::GhChecksMergeBlocked.as_str(),
                "PR is still a draft",
            ));
        }
        if policy.require_approval && !approved {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::GhChecksMergeBlocked.as_str(),
                "PR is not approved",
            ));
        }
        if policy.block_on_pending_checks
            && ctx.event.input.get("checksPending").and_then(|v| v.as_bool()).unwrap_or(false)
        {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::GhChecksMergeBlocked.as_str(),
                "PR has checks still pending",
            ));
        }
        if ctx.event.input.get("mergeBlocked").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::GhChecksMergeBlocked.as_str(),
                "PR merge is blocked by branch protection",
            ));
        }

        Ok(())
    }
}
