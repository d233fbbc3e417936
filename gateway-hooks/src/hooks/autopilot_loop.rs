//! Parses `/autopilot ...` (and its legacy aliases / rendered template
//! form) and drives [`LoopEngine::start`]/`resume`/`stop`/`pause`
//! accordingly. Matches the canonicalized command name directly rather
//! than going through [`slash_command::resolve_autopilot_action`] alone,
//! since that helper collapses `go`/`resume` and `stop`/`pause` into one
//! `Start`/`Stop` pair and this hook needs to tell them apart.
//!
//! Entirely advisory: a persistence failure is logged and swallowed, never
//! propagated as a rejection.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::loop_engine::LoopEngine;
use crate::registry::Hook;
use crate::slash_command::{self, canonical_autopilot_command_name};
use crate::types::{HookMetadata, PRIORITY_NORMAL};
use async_trait::async_trait;
use gateway_protocol::{CompletionMode, EventType, ReasonCode};

pub struct AutopilotLoop {
    metadata: HookMetadata,
}

impl AutopilotLoop {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("autopilot-loop", "Autopilot Loop").with_priority(PRIORITY_NORMAL),
        }
    }
}

impl Default for AutopilotLoop {
    fn default() -> Self {
        Self::new()
    }
}

enum Action<'a> {
    Go(&'a str),
    Resume,
    Stop,
    Pause,
    None,
}

fn classify<'a>(name: &str, args: &'a str) -> Action<'a> {
    match canonical_autopilot_command_name(name).as_str() {
        "autopilot-go" => Action::Go(args),
        "autopilot-resume" => Action::Resume,
        "autopilot-stop" => Action::Stop,
        "autopilot-pause" => Action::Pause,
        "autopilot" => match args.split_whitespace().next().unwrap_or("") {
            "go" => Action::Go(args.splitn(2, char::is_whitespace).nth(1).unwrap_or("").trim_start()),
            "resume" => Action::Resume,
            "stop" => Action::Stop,
            "pause" => Action::Pause,
            _ => Action::None,
        },
        _ => Action::None,
    }
}

#[async_trait]
impl Hook for AutopilotLoop {
    fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    fn events(&self) -> &'static [EventType] {
        &[EventType::CommandExecuteBefore, EventType::ToolExecuteBefore]
    }

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
        let Some(command) = ctx.event.command_text().map(str::to_string) else {
            return Ok(());
        };
        let Some(parsed) = slash_command::parse_slash_command(&command)
            .or_else(|| slash_command::parse_autopilot_template_command(&command))
        else {
            return Ok(());
        };
        let Some(session_id) = ctx.session_id() else {
            return Ok(());
        };
        let directory = ctx.directory().to_string();
        let default_promise = gateway_protocol::DEFAULT_COMPLETION_PROMISE;

        match classify(&parsed.name, &parsed.args) {
            Action::Go(args) => {
                let objective = slash_command::parse_goal(args).unwrap_or_default();
                if objective.is_empty() {
                    return Ok(());
                }
                let done_criteria = slash_command::parse_done_criteria(args);
                let completion_mode = if slash_command::parse_completion_mode(args) == "objective" {
                    CompletionMode::Objective
                } else {
                    CompletionMode::Promise
                };
                let completion_promise = slash_command::parse_completion_promise(args, default_promise);
                let max_iterations = slash_command::parse_max_iterations(args, 0);
                match LoopEngine::start(
                    &directory,
                    &session_id,
                    &objective,
                    done_criteria,
                    completion_mode,
                    Some(completion_promise),
                    max_iterations,
                ) {
                    Ok(_) => ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::LoopStarted.as_str()),
                    Err(err) => tracing::warn!(%session_id, error = %err, "autopilot loop start failed"),
                }
            }
            Action::Resume => {
                if let Err(err) = LoopEngine::resume(&directory) {
                    tracing::warn!(%session_id, error = %err, "autopilot loop resume failed");
                }
            }
            Action::Stop => {
                if let Err(err) = LoopEngine::stop(&directory, "autopilot-stop") {
                    tracing::warn!(%session_id, error = %err, "autopilot loop stop failed");
                } else {
                    ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::LoopStopped.as_str());
                }
            }
            Action::Pause => {
                if let Err(err) = LoopEngine::pause(&directory) {
                    tracing::warn!(%session_id, error = %err, "autopilot loop pause failed");
                }
            }
            Action::None => {}
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
    use crate::state_store::StateStore;
    use gateway_protocol::Event;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
    }

    #[tokio::test]
    async fn autopilot_go_starts_a_loop() {
        let dir = tempdir().unwrap();
        let directory = dir.path().to_str().unwrap();
        let runtime = runtime();
        let mut event = Event::new(directory, EventType::CommandExecuteBefore).with_input(serde_json::json!({
            "sessionID": "s1",
            "command": r#"/autopilot go --goal "ship the feature""#,
        }));
        let mut ctx = HookContext::new(&mut event, &runtime);
        AutopilotLoop::new().execute(&mut ctx).await.unwrap();
        let state = StateStore::load(directory).unwrap();
        assert!(state.active_loop.unwrap().active);
    }

    #[tokio::test]
    async fn autopilot_stop_deactivates_a_running_loop() {
        let dir = tempdir().unwrap();
        let directory = dir.path().to_str().unwrap();
        LoopEngine::start(
            directory,
            "s1",
            "goal",
            vec![],
            CompletionMode::Promise,
            Some("DONE".to_string()),
            0,
        )
        .unwrap();

        let runtime = runtime();
        let mut event = Event::new(directory, EventType::CommandExecuteBefore)
            .with_input(serde_json::json!({"sessionID": "s1", "command": "/autopilot stop"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        AutopilotLoop::new().execute(&mut ctx).await.unwrap();
        let state = StateStore::load(directory).unwrap();
        assert!(!state.active_loop.unwrap().active);
    }

    #[tokio::test]
    async fn non_autopilot_command_is_ignored() {
        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::CommandExecuteBefore)
            .with_input(serde_json::json!({"sessionID": "s1", "command": "/help"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        let result = AutopilotLoop::new().execute(&mut ctx).await;
        assert!(result.is_ok());
    }
}
