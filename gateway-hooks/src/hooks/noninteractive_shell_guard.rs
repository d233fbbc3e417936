//! Rewrites a `git` command that would otherwise drop into an interactive
//! pager or editor by prepending the policy's non-interactive environment
//! prefix. A non-git interactive command (vim, nano, ...) cannot be made
//! safe by prefixing env vars, so it is blocked outright instead.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use regex::Regex;

pub struct NoninteractiveShellGuard {
    metadata: HookMetadata,
}

impl NoninteractiveShellGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("noninteractive-shell-guard", "Noninteractive Shell Guard")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for NoninteractiveShellGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for NoninteractiveShellGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteBefore, EventType::CommandExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(command) = ctx.event.command_text().map(str::to_string) else {
            return Ok(());
        };

        let policy = ctx.policy().guards.noninteractive_shell.clone();
        let matches_interactive = policy
            .interactive_patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .any(|re| re.is_match(&command));
        if !matches_interactive {
            return Ok(());
        }

        if command.trim_start().starts_with("git") {
            let rewritten = format!("{}{}", policy.required_env_prefix, command);
            if let Some(map) = ctx.event.input.as_object_mut() {
                map.insert("command".to_string(), serde_json::Value::String(rewritten));
            }
            ctx.audit(
                &self.metadata.id,
                crate::audit::AuditStage::Inject,
                ReasonCode::NoninteractiveShellRewritten.as_str(),
            );
            return Ok(());
        }

        Err(ctx.reject(
            &self.metadata.id,
            ReasonCode::NoninteractiveShellBlocked.as_str(),
            "command would drop into an interactive program",
        ))
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
    use std::sync::Arc;

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
    }

    #[tokio::test]
    async fn rewrites_interactive_git_rebase() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "bash", "command": "git rebase -i HEAD~3"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = NoninteractiveShellGuard::new().execute(&mut ctx).await;
        assert!(result.is_ok());
        let command = ctx.event.input.get("command").unwrap().as_str().unwrap();
        assert!(command.starts_with("GIT_PAGER=cat"));
        assert!(command.contains("git rebase -i HEAD~3"));
    }

    #[tokio::test]
    async fn blocks_vim() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "bash", "command": "vim file.txt"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = NoninteractiveShellGuard::new().execute(&mut ctx).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn allows_benign_command() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"tool": "bash", "command": "git status"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = NoninteractiveShellGuard::new().execute(&mut ctx).await;
        assert!(result.is_ok());
        assert!(ctx.event.input.get("command").unwrap().as_str().unwrap() == "git status");
    }
}
