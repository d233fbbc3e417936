//! Two-sided guard around `gh pr merge`: blocks pre-tool when the command
//! omits `--delete-branch` (when required), and appends a post-merge sync
//! reminder to the tool output when the command didn't also sync `main`
//! inline.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_NORMAL};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

const SYNC_REMINDER: &str = "\n\nReminder: sync your local main branch (`git checkout main && git pull`).";

pub struct PostMergeSyncGuard {
    metadata: HookMetadata,
}

impl PostMergeSyncGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("post-merge-sync-guard", "Post-Merge Sync Guard").with_priority(PRIORITY_NORMAL),
        }
    }
}

impl Default for PostMergeSyncGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn is_pr_merge(command: &str) -> bool {
    command.contains("gh pr merge")
}

#[async_trait]
impl Hook for PostMergeSyncGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore, EventType::ToolExecuteAfter]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(command) = ctx.event.command_text() else {
            return Ok(());
        };
        if !is_pr_merge(command) {
            return Ok(());
        }

        match ctx.event.event_type {
            EventType::ToolExecuteBefore => {
                if ctx.policy().guards.post_merge_sync.require_delete_branch && !command.contains("--delete-branch") {
                    return Err(ctx.reject(
                        &self.metadata.id,
                        ReasonCode::PostMergeDeleteBranchMissing.as_str(),
                        "`gh pr merge` must include `--delete-branch`",
                    ));
                }
                Ok(())
            }
            EventType::ToolExecuteAfter => {
                if command.contains("git checkout main") || command.contains("git pull") {
                    return Ok(());
                }
                let Some(output) = ctx.event.output.get("output").and_then(|v| v.as_str()) else {
                    return Ok(());
                };
                let appended = format!("{output}{SYNC_REMINDER}");
                if let Some(map) = ctx.event.output.as_object_mut() {
                    map.insert("output".to_string(), serde_json::Value::String(appended));
                }
                ctx.audit(
                    &self.metadata.id,
                    crate::audit::AuditStage::Inject,
                    ReasonCode::PostMergeSyncReminderAppended.as_str(),
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
