//! Blocks bash commands matching a blocked-pattern set from policy.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};
use regex::Regex;

pub struct DangerousCommandGuard {
    metadata: HookMetadata,
}

impl DangerousCommandGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("dangerous-command-guard", "Dangerous Command Guard")
                .with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for DangerousCommandGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for DangerousCommandGuard {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::CommandExecuteBefore, EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        if ctx.event.tool_name().is_some_and(|t| t != "bash") {
            return Ok(());
        }
        let Some(command) = ctx.event.command_text() else {
            return Ok(());
        };

        for pattern in &ctx.policy().guards.dangerous_command.patterns {
            let Ok(re) = Regex::new(pattern) else {
                continue;
            };
            if re.is_match(command) {
                return Err(ctx.reject(
                    &self.metadata.id,
                    ReasonCode::DangerousCommandBlocked.as_str(),
                    format!("command matched blocked pattern `{pattern}`"),
                ));
            }
        }
        Ok(())
    }
}
