//! Event envelope and session-id resolution.

use serde::{Deserialize, Serialize};

/// The closed set of lifecycle events the host may deliver to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "chat.message")]
    ChatMessage,
    #[serde(rename = "command.execute.before")]
    CommandExecuteBefore,
    #[serde(rename = "tool.execute.before")]
    ToolExecuteBefore,
    #[serde(rename = "tool.execute.after")]
    ToolExecuteAfter,
    #[serde(rename = "session.idle")]
    SessionIdle,
    #[serde(rename = "session.error")]
    SessionError,
    #[serde(rename = "session.compacted")]
    SessionCompacted,
    #[serde(rename = "session.deleted")]
    SessionDeleted,
    #[serde(rename = "experimental.chat.messages.transform")]
    ExperimentalChatMessagesTransform,
    #[serde(rename = "message.updated")]
    MessageUpdated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ChatMessage => "chat.message",
            EventType::CommandExecuteBefore => "command.execute.before",
            EventType::ToolExecuteBefore => "tool.execute.before",
            EventType::ToolExecuteAfter => "tool.execute.after",
            EventType::SessionIdle => "session.idle",
            EventType::SessionError => "session.error",
            EventType::SessionCompacted => "session.compacted",
            EventType::SessionDeleted => "session.deleted",
            EventType::ExperimentalChatMessagesTransform => {
                "experimental.chat.messages.transform"
            }
            EventType::MessageUpdated => "message.updated",
        }
    }
}

/// A text part of a `chat.message` or transform message, Claude-Code-style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<bool>,
}

impl TextPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
            synthetic: None,
        }
    }

    pub fn synthetic(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
            synthetic: Some(true),
        }
    }
}

/// The full event envelope delivered by the host for one dispatch.
///
/// `input`/`properties` are read-only raw JSON as delivered by the host;
/// `output` is the mutable payload hooks are allowed to rewrite in place
/// (the chat `parts` array, the tool `output` string, or the transform
/// `messages` array, depending on `event_type`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub directory: String,
    pub event_type: EventType,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub properties: serde_json::Value,
    #[serde(default)]
    pub output: serde_json::Value,
}

impl Event {
    pub fn new(directory: impl Into<String>, event_type: EventType) -> Self {
        Self {
            directory: directory.into(),
            event_type,
            input: serde_json::Value::Null,
            properties: serde_json::Value::Null,
            output: serde_json::Value::Null,
        }
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = output;
        self
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    /// Resolve the session id by walking the alias chain deterministically.
    ///
    /// Order: `input.sessionID`, `input.sessionId`, `properties.sessionID`,
    /// `properties.info.id`, and — for transform events only — the last
    /// `role="user"` message's `info.sessionID`/`info.sessionId` inside
    /// `output.messages`.
    pub fn resolve_session_id(&self) -> Option<String> {
        if let Some(v) = str_at(&self.input, &["sessionID"]) {
            return Some(v);
        }
        if let Some(v) = str_at(&self.input, &["sessionId"]) {
            return Some(v);
        }
        if let Some(v) = str_at(&self.properties, &["sessionID"]) {
            return Some(v);
        }
        if let Some(v) = str_at(&self.properties, &["info", "id"]) {
            return Some(v);
        }
        if matches!(self.event_type, EventType::ExperimentalChatMessagesTransform) {
            if let Some(v) = self.last_user_message_session_id() {
                return Some(v);
            }
        }
        None
    }

    fn last_user_message_session_id(&self) -> Option<String> {
        let messages = self.output.get("messages")?.as_array()?;
        messages.iter().rev().find_map(|msg| {
            let role = msg.get("info")?.get("role")?.as_str()?;
            if role != "user" {
                return None;
            }
            str_at(msg, &["info", "sessionID"]).or_else(|| str_at(msg, &["info", "sessionId"]))
        })
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.input.get("tool").and_then(|v| v.as_str())
    }

    pub fn command_text(&self) -> Option<&str> {
        self.input
            .get("command")
            .and_then(|v| v.as_str())
            .or_else(|| self.input.as_str())
    }
}

fn str_at(value: &serde_json::Value, path: &[&str]) -> Option<String> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().map(|s| s.to_string())
}

/// Stable catalog of audit/guard reason codes. Opaque consumers may still
/// pass an arbitrary `&'static str`; this enum covers the codes this crate's
/// own hooks emit so call sites get compile-time-checked `as_str()` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    EventDispatch,
    ContextInjectChat,
    ContextInjectTransform,
    ContextTruncatedChat,
    ContextTruncatedTransform,
    ContextRequeuedNoTextPart,
    PendingContextTransformNoUserMessage,
    PendingContextTransformMissingParts,
    ContinuationStoppedCriticalMemoryPressure,
    GlobalProcessPressureCriticalAppended,
    SecretOutputRedacted,
    BlockedExistingWrite,
    DangerousCommandBlocked,
    PrBodyMissingSummarySection,
    PrBodyMissingValidationSection,
    PrBodyMissingValidationEvidence,
    PrBodyUninspectable,
    LoopStateAvailable,
    LoopStarted,
    LoopIterationAdvanced,
    LoopStopped,
    LoopStalledDeactivated,
    LoopMaxIterationsReached,
    LoopStaleDeactivated,
    HostApiError,
    SecretCommitBlocked,
    ParallelWriterConflictBlocked,
    BranchStaleBlocked,
    PostMergeSyncReminderAppended,
    PostMergeDeleteBranchMissing,
    GhChecksMergeBlocked,
    DocsDriftBlocked,
    NoninteractiveShellRewritten,
    NoninteractiveShellBlocked,
    WorkflowConformanceBlocked,
    SubagentQuestionBlocked,
    TasksTodowriteDisabled,
    ContinuationBlockedByStop,
    ContextWindowReminderAppended,
    PreemptiveCompactionTriggered,
    ProcessPressureWarning,
    ProcessPressureArmed,
    ProviderErrorClassified,
    ProviderRetryBackoffComputed,
    CodexHeaderInjected,
    PlanHandoffReminderAppended,
    ModeTransitionReminderAppended,
    TodoreadCadenceReminderAppended,
    CompactionTodoRestored,
    SessionRecoveryReprompted,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::EventDispatch => "event_dispatch",
            ReasonCode::ContextInjectChat => "context_inject_chat",
            ReasonCode::ContextInjectTransform => "context_inject_transform",
            ReasonCode::ContextTruncatedChat => "context_truncated_chat",
            ReasonCode::ContextTruncatedTransform => "context_truncated_transform",
            ReasonCode::ContextRequeuedNoTextPart => "context_requeued_no_text_part",
            ReasonCode::PendingContextTransformNoUserMessage => {
                "pending_context_transform_no_user_message"
            }
            ReasonCode::PendingContextTransformMissingParts => {
                "pending_context_transform_missing_parts"
            }
            ReasonCode::ContinuationStoppedCriticalMemoryPressure => {
                "continuation_stopped_critical_memory_pressure"
            }
            ReasonCode::GlobalProcessPressureCriticalAppended => {
                "global_process_pressure_critical_appended"
            }
            ReasonCode::SecretOutputRedacted => "secret_output_redacted",
            ReasonCode::BlockedExistingWrite => "blocked_existing_write",
            ReasonCode::DangerousCommandBlocked => "dangerous_command_blocked",
            ReasonCode::PrBodyMissingSummarySection => "pr_body_missing_summary_section",
            ReasonCode::PrBodyMissingValidationSection => "pr_body_missing_validation_section",
            ReasonCode::PrBodyMissingValidationEvidence => "pr_body_missing_validation_evidence",
            ReasonCode::PrBodyUninspectable => "pr_body_uninspectable",
            ReasonCode::LoopStateAvailable => "loop_state_available",
            ReasonCode::LoopStarted => "gateway_loop_started",
            ReasonCode::LoopIterationAdvanced => "gateway_loop_iteration_advanced",
            ReasonCode::LoopStopped => "gateway_loop_stopped",
            ReasonCode::LoopStalledDeactivated => "gateway_loop_completion_stalled_runtime",
            ReasonCode::LoopMaxIterationsReached => "max_iterations_reached",
            ReasonCode::LoopStaleDeactivated => "stale_loop_deactivated",
            ReasonCode::HostApiError => "host_api_error",
            ReasonCode::SecretCommitBlocked => "secret_commit_blocked",
            ReasonCode::ParallelWriterConflictBlocked => "parallel_writer_conflict_blocked",
            ReasonCode::BranchStaleBlocked => "branch_stale_blocked",
            ReasonCode::PostMergeSyncReminderAppended => "post_merge_sync_reminder_appended",
            ReasonCode::PostMergeDeleteBranchMissing => "post_merge_delete_branch_missing",
            ReasonCode::GhChecksMergeBlocked => "gh_checks_merge_blocked",
            ReasonCode::DocsDriftBlocked => "docs_drift_blocked",
            ReasonCode::NoninteractiveShellRewritten => "noninteractive_shell_rewritten",
            ReasonCode::NoninteractiveShellBlocked => "noninteractive_shell_blocked",
            ReasonCode::WorkflowConformanceBlocked => "workflow_conformance_blocked",
            ReasonCode::SubagentQuestionBlocked => "subagent_question_blocked",
            ReasonCode::TasksTodowriteDisabled => "tasks_todowrite_disabled",
            ReasonCode::ContinuationBlockedByStop => "continuation_blocked_by_stop",
            ReasonCode::ContextWindowReminderAppended => "context_window_reminder_appended",
            ReasonCode::PreemptiveCompactionTriggered => "preemptive_compaction_triggered",
            ReasonCode::ProcessPressureWarning => "global_process_pressure_warning",
            ReasonCode::ProcessPressureArmed => "global_process_pressure_armed",
            ReasonCode::ProviderErrorClassified => "provider_error_classified",
            ReasonCode::ProviderRetryBackoffComputed => "provider_retry_backoff_computed",
            ReasonCode::CodexHeaderInjected => "codex_header_injected",
            ReasonCode::PlanHandoffReminderAppended => "plan_handoff_reminder_appended",
            ReasonCode::ModeTransitionReminderAppended => "mode_transition_reminder_appended",
            ReasonCode::TodoreadCadenceReminderAppended => "todoread_cadence_reminder_appended",
            ReasonCode::CompactionTodoRestored => "compaction_todo_restored",
            ReasonCode::SessionRecoveryReprompted => "session_recovery_reprompted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub parts: Vec<TextPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_session_id_from_input_alias_chain() {
        let event = Event::new("/tmp", EventType::ToolExecuteBefore)
            .with_input(serde_json::json!({"sessionID": "sess-1"}));
        assert_eq!(event.resolve_session_id(), Some("sess-1".to_string()));
    }

    #[test]
    fn falls_back_through_alias_order() {
        let event = Event::new("/tmp", EventType::ChatMessage).with_properties(
            serde_json::json!({"info": {"id": "sess-from-properties-info"}}),
        );
        assert_eq!(
            event.resolve_session_id(),
            Some("sess-from-properties-info".to_string())
        );
    }

    #[test]
    fn input_session_id_wins_over_properties() {
        let event = Event::new("/tmp", EventType::ChatMessage)
            .with_input(serde_json::json!({"sessionId": "from-input"}))
            .with_properties(serde_json::json!({"sessionID": "from-properties"}));
        assert_eq!(event.resolve_session_id(), Some("from-input".to_string()));
    }

    #[test]
    fn transform_event_resolves_from_last_user_message() {
        let event = Event::new("/tmp", EventType::ExperimentalChatMessagesTransform).with_output(
            serde_json::json!({
                "messages": [
                    {"info": {"role": "assistant", "sessionID": "assistant-sess"}},
                    {"info": {"role": "user", "sessionID": "user-sess"}},
                ]
            }),
        );
        assert_eq!(event.resolve_session_id(), Some("user-sess".to_string()));
    }

    #[test]
    fn unresolvable_session_id_is_none() {
        let event = Event::new("/tmp", EventType::SessionIdle);
        assert_eq!(event.resolve_session_id(), None);
    }

    #[test]
    fn reason_code_strings_are_stable() {
        assert_eq!(ReasonCode::DangerousCommandBlocked.as_str(), "dangerous_command_blocked");
        assert_eq!(
            ReasonCode::LoopStalledDeactivated.as_str(),
            "gateway_loop_completion_stalled_runtime"
        );
    }
}
