//! Blocks a commit that touches source files matching
//! `guards.docs_drift.source_patterns` without also touching a doc file
//! matching `docs_patterns`. Staged file list is host-populated on
//! `input.stagedFiles`, the same way `secret-commit-guard` reads
//! `stagedDiff`.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use regex::Regex;

pub struct DocsDriftGuard {
    metadata: HookMetadata,
}

impl DocsDriftGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("docs-drift-guard", "Docs Drift Guard").with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for DocsDriftGuard {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_any(patterns: &[String], path: &str) -> bool {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).any(|re| re.is_match(path))
}

#[async_trait]
impl Hook for DocsDriftGuard {
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
        if !command.contains("git commit") {
            return Ok(());
        }

        let Some(staged_files) = ctx.event.input.get("stagedFiles").and_then(|v| v.as_array()) else {
            return Ok(());
        };
        let staged_files: Vec<&str> = staged_files.iter().filter_map(|v| v.as_str()).collect();

        let policy = &ctx.policy().guards.docs_drift;
        let touches_source = staged_files.iter().any(|f| matches_any(&policy.source_patterns, f));
        if !touches_source {
            return Ok(());
        }
        let touches_docs = staged_files.iter().any(|f| matches_any(&policy.docs_patterns, f));
        if touches_docs {
            return Ok(());
        }

        Err(ctx.reject(
            &self.metadata.id,
            ReasonCode::DocsDriftBlocked.as_str(),
            "commit touches source files but no matching documentation",
        ))
    }
}
