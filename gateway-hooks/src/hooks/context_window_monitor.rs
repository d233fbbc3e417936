//! Tracks context window usage and appends a cooldown-gated reminder to
//! tool output once usage crosses the warn/critical thresholds. Token
//! counts and the model's context window size are host-populated fields
//! (`input.tokensUsed`/`input.contextWindow`), the same pattern other
//! guards use for `stagedDiff`/`behindCount`. When the host omits
//! `contextWindow`, it's inferred from `ANTHROPIC_1M_CONTEXT`.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::env;
use crate::policy::{GuardMarkerMode, GuardVerbosity};
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

const DEFAULT_CONTEXT_WINDOW: u64 = 200_000;
const EXPANDED_CONTEXT_WINDOW: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, Default)]
struct ReminderState {
    last_reminded_tokens: u64,
    calls_since_last: u32,
}

pub struct ContextWindowMonitor {
    metadata: HookMetadata,
    state: SessionRuntimeMap<ReminderState>,
}

impl ContextWindowMonitor {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("context-window-monitor", "Context Window Monitor").with_priority(PRIORITY_LATE),
            state: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for ContextWindowMonitor {
    fn default() -> Self {
        Self::new()
    }
}

enum Tier {
    Warn,
    Critical,
}

fn format_reminder(mode: GuardMarkerMode, verbosity: GuardVerbosity, tier: &Tier, fraction: f64) -> String {
    let label = match tier {
        Tier::Warn => "approaching the context window limit",
        Tier::Critical => "very close to the context window limit",
    };
    let detail = match verbosity {
        GuardVerbosity::Minimal => String::new(),
        GuardVerbosity::Normal => format!(" ({:.0}% used)", fraction * 100.0),
        GuardVerbosity::Verbose => format!(
            " ({:.1}% of the available context window has been used; consider wrapping up or summarizing)",
            fraction * 100.0
        ),
    };
    match mode {
        GuardMarkerMode::Marker => format!("\n\n[context-window] {label}{detail}"),
        GuardMarkerMode::Status => format!("\n\nContext status: {label}{detail}."),
        GuardMarkerMode::Both => format!("\n\n[context-window] {label}{detail}\nContext status: {label}{detail}."),
    }
}

#[async_trait]
impl Hook for ContextWindowMonitor {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::ToolExecuteAfter]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };
        let Some(tokens_used) = ctx.event.input.get("tokensUsed").and_then(|v| v.as_u64()) else {
            return Ok(());
        };
        let default_window = if env::flag(env::ANTHROPIC_1M_CONTEXT) {
            EXPANDED_CONTEXT_WINDOW
        } else {
            DEFAULT_CONTEXT_WINDOW
        };
        let context_window = ctx
            .event
            .input
            .get("contextWindow")
            .and_then(|v| v.as_u64())
            .unwrap_or(default_window);
        if context_window == 0 {
            return Ok(());
        }

        let fraction = tokens_used as f64 / context_window as f64;
        let policy = ctx.policy().context_monitor.clone();
        let tier = if fraction >= policy.critical_threshold {
            Tier::Critical
        } else if fraction >= policy.warn_threshold {
            Tier::Warn
        } else {
            self.state.remove(&session_id);
            return Ok(());
        };

        let mut state = self.state.get(&session_id).unwrap_or_default();
        state.calls_since_last += 1;

        let delta = tokens_used.saturating_sub(state.last_reminded_tokens);
        let should_remind = state.last_reminded_tokens == 0
            || (state.calls_since_last >= policy.reminder_cooldown_tool_calls && delta >= policy.min_token_delta_for_reminder);

        if !should_remind {
            self.state.insert(&session_id, state);
            return Ok(());
        }

        let reminder = format_reminder(policy.guard_marker_mode, policy.guard_verbosity, &tier, fraction);
        let output = ctx.event.output.get("output").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let appended = format!("{output}{reminder}");
        if let Some(map) = ctx.event.output.as_object_mut() {
            map.insert("output".to_string(), serde_json::Value::String(appended));
        }

        state.last_reminded_tokens = tokens_used;
        state.calls_since_last = 0;
        self.state.insert(&session_id, state);

        ctx.audit(
            &self.metadata.id,
            crate::audit::AuditStage::Inject,
            ReasonCode::ContextWindowReminderAppended.as_str(),
        );
        Ok(())
    }
}
