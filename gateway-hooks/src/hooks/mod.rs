//! Every hook body the gateway ships, grouped loosely by concern: guards
//! that can reject an action, the continuation loop's own hooks, context
//! injection, and advisory hooks that only ever observe or append.

pub mod autopilot_loop;
pub mod branch_freshness_guard;
pub mod codex_header_injector;
pub mod compaction_todo_preserver;
pub mod context_injector;
pub mod context_window_monitor;
pub mod continuation;
pub mod dangerous_command_guard;
pub mod docs_drift_guard;
pub mod gh_checks_merge_guard;
pub mod global_process_pressure;
pub mod mode_transition_reminder;
pub mod noninteractive_shell_guard;
pub mod parallel_writer_conflict_guard;
pub mod plan_handoff_reminder;
pub mod post_merge_sync_guard;
pub mod pr_body_evidence_guard;
pub mod preemptive_compaction;
pub mod provider_error_classifier;
pub mod provider_retry_backoff_guidance;
pub mod secret_commit_guard;
pub mod secret_leak_guard;
pub mod session_recovery;
pub mod stop_continuation_guard;
pub mod subagent_question_blocker;
pub mod tasks_todowrite_disabler;
pub mod todoread_cadence_reminder;
pub mod workflow_conformance_guard;
pub mod write_existing_file_guard;

pub use autopilot_loop::AutopilotLoop;
pub use branch_freshness_guard::BranchFreshnessGuard;
pub use codex_header_injector::CodexHeaderInjector;
pub use compaction_todo_preserver::CompactionTodoPreserver;
pub use context_injector::ContextInjector;
pub use context_window_monitor::ContextWindowMonitor;
pub use continuation::Continuation;
pub use dangerous_command_guard::DangerousCommandGuard;
pub use docs_drift_guard::DocsDriftGuard;
pub use gh_checks_merge_guard::GhChecksMergeGuard;
pub use global_process_pressure::GlobalProcessPressure;
pub use mode_transition_reminder::ModeTransitionReminder;
pub use noninteractive_shell_guard::NoninteractiveShellGuard;
pub use parallel_writer_conflict_guard::ParallelWriterConflictGuard;
pub use plan_handoff_reminder::PlanHandoffReminder;
pub use post_merge_sync_guard::PostMergeSyncGuard;
pub use pr_body_evidence_guard::PrBodyEvidenceGuard;
pub use preemptive_compaction::PreemptiveCompaction;
pub use provider_error_classifier::ProviderErrorClassifier;
pub use provider_retry_backoff_guidance::ProviderRetryBackoffGuidance;
pub use secret_commit_guard::SecretCommitGuard;
pub use secret_leak_guard::SecretLeakGuard;
pub use session_recovery::SessionRecovery;
pub use stop_continuation_guard::StopContinuationGuard;
pub use subagent_question_blocker::SubagentQuestionBlocker;
pub use tasks_todowrite_disabler::TasksTodowriteDisabler;
pub use todoread_cadence_reminder::TodoreadCadenceReminder;
pub use workflow_conformance_guard::WorkflowConformanceGuard;
pub use write_existing_file_guard::WriteExistingFileGuard;

use crate::registry::{Hook, HookRegistry};
use std::sync::Arc;

/// Construct and register one instance of every hook this crate ships, in
/// no particular order (the registry itself sorts by priority/id at
/// dispatch time). Embedders that want a reduced set should register hooks
/// individually instead of calling this.
pub fn register_all(registry: &mut HookRegistry) {
    let hooks: Vec<Arc<dyn Hook>> = vec![
        Arc::new(AutopilotLoop::new()),
        Arc::new(BranchFreshnessGuard::new()),
        Arc::new(CodexHeaderInjector::new()),
        Arc::new(CompactionTodoPreserver::new()),
        Arc::new(ContextInjector::new()),
        Arc::new(ContextWindowMonitor::new()),
        Arc::new(Continuation::new()),
        Arc::new(DangerousCommandGuard::new()),
        Arc::new(DocsDriftGuard::new()),
        Arc::new(GhChecksMergeGuard::new()),
        Arc::new(GlobalProcessPressure::new()),
        Arc::new(ModeTransitionReminder::new()),
        Arc::new(NoninteractiveShellGuard::new()),
        Arc::new(ParallelWriterConflictGuard::new()),
        Arc::new(PlanHandoffReminder::new()),
        Arc::new(PostMergeSyncGuard::new()),
        Arc::new(PrBodyEvidenceGuard::new()),
        Arc::new(PreemptiveCompaction::new()),
        Arc::new(ProviderErrorClassifier::new()),
        Arc::new(ProviderRetryBackoffGuidance::new()),
        Arc::new(SecretCommitGuard::new()),
        Arc::new(SecretLeakGuard::new()),
        Arc::new(SessionRecovery::new()),
        Arc::new(StopContinuationGuard::new()),
        Arc::new(SubagentQuestionBlocker::new()),
        Arc::new(TasksTodowriteDisabler::new()),
        Arc::new(TodoreadCadenceReminder::new()),
        Arc::new(WorkflowConformanceGuard::new()),
        Arc::new(WriteExistingFileGuard::new()),
    ];
    for hook in hooks {
        registry.register(hook);
    }
}
