//! Blocks `gh pr create` when the PR body is missing required evidence
//! sections. The body is extracted from the `--body "..."` flag of the
//! command text; a `--body-file` invocation cannot be inspected here and
//! is let through with an audit note rather than a false-positive block.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::types::{HookMetadata, PRIORITY_EARLY};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct PrBodyEvidenceGuard {
    metadata: HookMetadata,
}

impl PrBodyEvidenceGuard {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("pr-body-evidence-guard", "PR Body Evidence Guard").with_priority(PRIORITY_EARLY),
        }
    }
}

impl Default for PrBodyEvidenceGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the quoted argument following `--body` from a `gh pr create`
/// invocation, unescaping `\n` the way a shell-rendered string would carry
/// newlines through a double-quoted argument.
fn extract_body(command: &str) -> Option<String> {
    let idx = command.find("--body")?;
    let rest = command[idx + "--body".len()..].trim_start();
    let quoted = rest.strip_prefix('"')?;
    let end = quoted.find('"')?;
    Some(quoted[..end].replace("\\n", "\n"))
}

#[async_trait]
impl Hook for PrBodyEvidenceGuard {
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
        if !command.contains("gh pr create") {
            return Ok(());
        }

        if command.contains("--body-file") {
            ctx.audit(&self.metadata.id, crate::audit::AuditStage::Skip, ReasonCode::PrBodyUninspectable.as_str());
            return Ok(());
        }

        let Some(body) = extract_body(command) else {
            ctx.audit(&self.metadata.id, crate::audit::AuditStage::Skip, ReasonCode::PrBodyUninspectable.as_str());
            return Ok(());
        };

        if !body.contains("## Summary") {
            return Err(ctx.reject(
                &self.metadata.id,
                ReasonCode::PrBodyMissingSummarySection.as_str(),
                "PR body is missing a `## Summary` section",
            ));
        }

        if ctx.policy().guards.pr_body_evidence.require_validation_section {
            if !body.contains("## Validation") {
                return Err(ctx.reject(
                    &self.metadata.id,
                    ReasonCode::PrBodyMissingValidationSection.as_str(),
                    "PR body is missing a `## Validation` section",
                ));
            }

            let validation_section = body.split("## Validation").nth(1).unwrap_or("");
            let has_evidence = validation_section.lines().any(|line| {
                let trimmed = line.trim_start();
                trimmed.starts_with('-') || trimmed.starts_with('*') || trimmed.to_lowercase().contains("passed")
            });
            if !has_evidence {
                return Err(ctx.reject(
                    &self.metadata.id,
                    ReasonCode::PrBodyMissingValidationEvidence.as_str(),
                    "`## Validation` section has no evidence ledger entries",
                ));
            }
        }

        Ok(())
    }
}
