//! Blocks a write/edit when too many writers are active concurrently, or
//! when the target path falls outside this writer's file reservation, or
//! overlaps another writer's active reservation.
//!
//! Writer counts and reservation paths are read from the environment
//! rather than the policy document: they describe the *current* process
//! topology (`MY_OPENCODE_ACTIVE_WRITERS`), not a configuration choice.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::env;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct ParallelWriterConflictGuard {
    metadata: HookMetadata,
}

impl ParallelWriterConflictGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("parallel-writer-conflict-guard", "Parallel Writer Conflict Guard")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for ParallelWriterConflictGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for ParallelWriterConflictGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(tool) = ctx.event.tool_name() else {
            return Ok(());
        };
        if tool != "write" && tool != "edit" {
            return Ok(());
        }

        let active_writers = env::numeric(env::ACTIVE_WRITERS).unwrap_or(0);
        let max_writers = ctx.policy().guards.parallel_writer.max_concurrent_writers as u64;
        if active_writers > max_writers {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::ParallelWriterConflictBlocked.as_str(),
                format!("{active_writers} writers active, exceeds max of {max_writers}"),
            ));
        }

        let Some(file_path) = ctx.event.input.get("filePath").and_then(|v| v.as_str()) else {
            return Ok(());
        };

        let reservation_paths = env::path_list(env::FILE_RESERVATION_PATHS);
        if !reservation_paths.is_empty() && !reservation_paths.iter().any(|p| file_path.starts_with(p.as_str())) {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::ParallelWriterConflictBlocked.as_str(),
                format!("`{file_path}` is outside this session's reserved paths"),
            ));
        }

        let active_reservations = env::path_list(env::ACTIVE_RESERVATION_PATHS);
        if active_reservations
            .iter()
            .any(|p| !reservation_paths.contains(p) && file_path.starts_with(p.as_str()))
        {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::ParallelWriterConflictBlocked.as_str(),
                format!("`{file_path}` overlaps another writer's active reservation"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditSink;
    use crate::context::GatewayRuntime;
    use crate::host_api::FakeHostApi;
    use crate::policy::Policy;
    use gateway_protocol::Event;
    use serial_test::serial;
    use std::sync::Arc;

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
    }

    #[tokio::test]
    #[serial]
    async fn blocks_when_writer_count_exceeds_max() {
        std::env::set_var(env::ACTIVE_WRITERS, "5");
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "write", "filePath": "a.rs"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = ParallelWriterConflictGuard::new().execute(&mut ctx).await;
        assert!(result.is_err());
        std::env::remove_var(env::ACTIVE_WRITERS);
    }

    #[tokio::test]
    #[serial]
    async fn blocks_write_outside_reservation_coverage() {
        std::env::remove_var(env::ACTIVE_WRITERS);
        std::env::set_var(env::FILE_RESERVATION_PATHS, "src/allowed/");
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "write", "filePath": "src/other/file.rs"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = ParallelWriterConflictGuard::new().execute(&mut ctx).await;
        assert!(result.is_err());
        std::env::remove_var(env::FILE_RESERVATION_PATHS);
    }

    #[tokio::test]
    #[serial]
    async fn allows_write_within_reservation() {
        std::env::remove_var(env::ACTIVE_WRITERS);
        std::env::set_var(env::FILE_RESERVATION_PATHS, "src/allowed/");
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "write", "filePath": "src/allowed/file.rs"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = ParallelWriterConflictGuard::new().execute(&mut ctx).await;
        assert!(result.is_ok());
        std::env::remove_var(env::FILE_RESERVATION_PATHS);
    }
}
