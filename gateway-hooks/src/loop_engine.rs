//! Owns the [`ActiveLoop`] lifecycle: start/stop/pause/resume transitions
//! and the `session.idle`-driven re-prompt cycle described in the
//! continuation loop state machine.

use crate::collector::{PendingContextCollector, RegisterRequest};
use crate::host_api::{HostApi, HostApiError, PromptBody, PromptPart};
use crate::policy::LoopPolicy;
use crate::runtime_file;
use crate::state_store::{StateStore, StateStoreError};
use chrono::Utc;
use gateway_protocol::{ActiveLoop, CompletionMode, GatewayState, Priority};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleOutcome {
    NoActiveLoop,
    SessionMismatch,
    Advanced { iteration: u64 },
    StalledDeactivated,
    MaxIterationsReached,
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopEngineError {
    #[error(transparent)]
    StateStore(#[from] StateStoreError),

    #[error(transparent)]
    HostApi(#[from] HostApiError),
}

pub struct LoopEngine;

impl LoopEngine {
    pub fn start(
        directory: &str,
        session_id: &str,
        objective: &str,
        done_criteria: Vec<String>,
        completion_mode: CompletionMode,
        completion_promise: Option<String>,
        max_iterations: u64,
    ) -> Result<ActiveLoop, LoopEngineError> {
        let now = Utc::now();
        let active_loop = ActiveLoop::start(
            session_id,
            objective,
            done_criteria,
            completion_mode,
            completion_promise,
            max_iterations,
            now,
        );
        let state = GatewayState::with_loop(active_loop.clone(), now, "start");
        StateStore::save(directory, &state)?;
        Ok(active_loop)
    }

    pub fn stop(directory: &str, source: &str) -> Result<(), LoopEngineError> {
        Self::set_active(directory, false, source)
    }

    pub fn pause(directory: &str) -> Result<(), LoopEngineError> {
        Self::set_active(directory, false, "pause")
    }

    pub fn resume(directory: &str) -> Result<(), LoopEngineError> {
        Self::set_active(directory, true, "resume")
    }

    fn set_active(directory: &str, active: bool, source: &str) -> Result<(), LoopEngineError> {
        let Some(mut state) = StateStore::load(directory) else {
            return Ok(());
        };
        if let Some(active_loop) = state.active_loop.as_mut() {
            active_loop.active = active;
        }
        state.last_updated_at = Some(Utc::now());
        state.source = Some(source.to_string());
        StateStore::save(directory, &state)?;
        Ok(())
    }

    /// Drive one `session.idle` transition for `session_id`.
    pub async fn on_session_idle(
        directory: &str,
        session_id: &str,
        policy: &LoopPolicy,
        collector: &PendingContextCollector,
        host: &dyn HostApi,
    ) -> Result<IdleOutcome, LoopEngineError> {
        let Some(mut state) = StateStore::load(directory) else {
            return Ok(IdleOutcome::NoActiveLoop);
        };
        let Some(active_loop) = state.active_loop.as_mut() else {
            return Ok(IdleOutcome::NoActiveLoop);
        };
        if !active_loop.active {
            return Ok(IdleOutcome::NoActiveLoop);
        }
        if active_loop.session_id != session_id {
            return Ok(IdleOutcome::SessionMismatch);
        }

        let messages = host.session_messages(session_id).await?;
        let last_assistant_text = messages
            .iter()
            .rev()
            .find(|m| m.info.role == "assistant")
            .map(|m| m.text.clone())
            .unwrap_or_default();

        let runtime = runtime_file::load_runtime_file();
        let runtime_incomplete = runtime.as_ref().map(|r| r.is_runtime_incomplete()).unwrap_or(false);
        let runtime_terminal = runtime.as_ref().map(|r| r.status.is_terminal()).unwrap_or(true);

        let completion_observed = match active_loop.completion_mode {
            CompletionMode::Promise => {
                last_assistant_text.contains(&format!("<promise>{}</promise>", active_loop.completion_promise))
            }
            CompletionMode::Objective => runtime_terminal,
        };

        let outcome = if completion_observed && !runtime_incomplete {
            active_loop.active = false;
            state.source = Some("completed".to_string());
            state.last_updated_at = Some(Utc::now());
            StateStore::save(directory, &state)?;
            return Ok(IdleOutcome::Completed);
        } else if completion_observed && runtime_incomplete {
            active_loop.ignored_completion_cycles += 1;
            active_loop.iteration += 1;
            if active_loop.ignored_completion_cycles >= policy.max_ignored_completion_cycles {
                active_loop.active = false;
                state.source = Some("gateway_loop_completion_stalled_runtime".to_string());
                state.last_updated_at = Some(Utc::now());
                StateStore::save(directory, &state)?;
                return Ok(IdleOutcome::StalledDeactivated);
            }
            IdleOutcome::Advanced {
                iteration: active_loop.iteration,
            }
        } else {
            active_loop.iteration += 1;
            IdleOutcome::Advanced {
                iteration: active_loop.iteration,
            }
        };

        if active_loop.exceeded_max_iterations() {
            active_loop.active = false;
            state.source = Some("max_iterations_reached".to_string());
            state.last_updated_at = Some(Utc::now());
            StateStore::save(directory, &state)?;
            return Ok(IdleOutcome::MaxIterationsReached);
        }

        let Some(active_loop) = state.active_loop.as_ref() else {
            return Ok(outcome);
        };
        collector.register(
            session_id,
            RegisterRequest {
                source: "continuation".to_string(),
                id: "objective-summary".to_string(),
                content: continuation_summary(active_loop),
                priority: Priority::Normal,
                metadata: None,
            },
        );
        let prompt_text = build_continuation_prompt(active_loop);
        host.session_prompt_async(
            session_id,
            PromptBody {
                parts: vec![PromptPart::text(prompt_text)],
                agent: None,
                model: None,
            },
        )
        .await?;

        state.last_updated_at = Some(Utc::now());
        state.source = Some("session_idle".to_string());
        StateStore::save(directory, &state)?;

        Ok(outcome)
    }
}

fn continuation_summary(active_loop: &ActiveLoop) -> String {
    format!("Objective: {}\nIteration: {}", active_loop.objective, active_loop.iteration)
}

fn build_continuation_prompt(active_loop: &ActiveLoop) -> String {
    let mut text = format!("Continuing objective: {}\n", active_loop.objective);
    if !active_loop.done_criteria.is_empty() {
        text.push_str("Checklist items:\n");
        for item in &active_loop.done_criteria {
            text.push_str(&format!("- {item}\n"));
        }
    }
    text.push_str("Do not ask the user for checklist items; complete them yourself and report progress.\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_api::{FakeHostApi, Message, MessageInfo};
    use serial_test::serial;
    use tempfile::tempdir;

    fn policy() -> LoopPolicy {
        LoopPolicy {
            max_ignored_completion_cycles: 2,
            stale_loop_max_age_hours: 12,
            bootstrap_from_runtime: false,
        }
    }

    #[tokio::test]
    async fn scenario_one_loop_bootstrap_and_first_reprompt() {
        let dir = tempdir().unwrap();
        let directory = dir.path().to_str().unwrap();
        let done_criteria = vec![
            "2x + 1".to_string(),
            "5x -2".to_string(),
            "x^2 + 1".to_string(),
            "-2x + 6".to_string(),
            "3x + 5".to_string(),
        ];
        LoopEngine::start(
            directory,
            "session-instructions",
            "process a five-item checklist",
            done_criteria.clone(),
            CompletionMode::Promise,
            Some("DONE".to_string()),
            0,
        )
        .unwrap();

        let host = FakeHostApi::new();
        let collector = PendingContextCollector::new();
        let outcome =
            LoopEngine::on_session_idle(directory, "session-instructions", &policy(), &collector, &host)
                .await
                .unwrap();

        assert_eq!(outcome, IdleOutcome::Advanced { iteration: 2 });
        assert_eq!(host.prompt_count(), 1);
        let prompt = host.last_prompt_text().unwrap();
        for item in &done_criteria {
            assert!(prompt.contains(item));
        }
        assert!(prompt.contains("Do not ask the user for checklist items"));
    }

    #[tokio::test]
    #[serial]
    async fn scenario_two_stalled_completion_deactivation() {
        let dir = tempdir().unwrap();
        let directory = dir.path().to_str().unwrap();
        LoopEngine::start(
            directory,
            "session-stalled-runtime",
            "goal",
            vec![],
            CompletionMode::Promise,
            Some("DONE".to_string()),
            0,
        )
        .unwrap();

        let runtime_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            runtime_file.path(),
            r#"{"status":"running","blockers":["completion_promise_missing"],"progress":{"completed_cycles":0,"pending_cycles":0}}"#,
        )
        .unwrap();
        std::env::set_var(
            crate::runtime_file::RUNTIME_PATH_ENV_VAR,
            runtime_file.path(),
        );

        let host = FakeHostApi::new();
        host.seed_messages(
            "session-stalled-runtime",
            vec![Message {
                info: MessageInfo {
                    role: "assistant".to_string(),
                    ..Default::default()
                },
                text: "<promise>DONE</promise>".to_string(),
            }],
        );
        let collector = PendingContextCollector::new();

        let first = LoopEngine::on_session_idle(
            directory,
            "session-stalled-runtime",
            &policy(),
            &collector,
            &host,
        )
        .await
        .unwrap();
        assert_eq!(first, IdleOutcome::Advanced { iteration: 2 });
        assert_eq!(host.prompt_count(), 1);

        let second = LoopEngine::on_session_idle(
            directory,
            "session-stalled-runtime",
            &policy(),
            &collector,
            &host,
        )
        .await
        .unwrap();
        assert_eq!(second, IdleOutcome::StalledDeactivated);
        assert_eq!(host.prompt_count(), 1);

        std::env::remove_var(crate::runtime_file::RUNTIME_PATH_ENV_VAR);
    }
}
