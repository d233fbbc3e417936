//! Blocks `tool=write` against a file that already exists, outside the
//! policy-configured allowed prefixes (e.g. `.sisyphus/*.md` scratch notes).

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use std::path::Path;

pub struct WriteExistingFileGuard {
    metadata: HookMetadata,
}

impl WriteExistingFileGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("write-existing-file-guard", "Write Existing File Guard")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for WriteExistingFileGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for WriteExistingFileGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        if ctx.event.tool_name() != Some("write") {
            return Ok(());
        }
        let Some(file_path) = ctx.event.input.get("filePath").and_then(|v| v.as_str()) else {
            return Ok(());
        };

        if ctx
            .policy()
            .guards
            .write_existing_file
            .allowed_prefixes
            .iter()
            .any(|prefix| file_path.starts_with(prefix.as_str()))
        {
            return Ok(());
        }

        let absolute = Path::new(ctx.directory()).join(file_path);
        if !absolute.exists() {
            return Ok(());
        }

        Err(ctx.reject(
            &self.metadata.id,
            ReasonCode::BlockedExistingWrite.as_str(),
            "Use edit tool instead of write for an existing file",
        ))
    }
}
