//! Policy loading: layered configuration merged into a frozen [`Policy`].
//!
//! Mirrors the teacher's `config.rs` split between parsing a TOML document
//! and constructing the runtime object: [`load_policy_from_file`] only
//! parses, [`Policy::from_document`] normalizes every field to a safe
//! default and never panics or rejects the document outright.

use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksPolicy {
    pub enabled: bool,
    pub order: Option<Vec<String>>,
    pub disabled: Vec<String>,
}

impl Default for HooksPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            order: None,
            disabled: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditPolicy {
    pub enabled: bool,
    pub path: Option<String>,
    pub max_bytes: u64,
    pub max_backups: u32,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
            max_bytes: 1024 * 1024,
            max_backups: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopPolicy {
    pub max_ignored_completion_cycles: u64,
    pub stale_loop_max_age_hours: u64,
    pub bootstrap_from_runtime: bool,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self {
            max_ignored_completion_cycles: 2,
            stale_loop_max_age_hours: 12,
            bootstrap_from_runtime: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorPolicy {
    pub max_chars: usize,
}

impl Default for CollectorPolicy {
    fn default() -> Self {
        Self { max_chars: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerousCommandPolicy {
    pub patterns: Vec<String>,
}

impl Default for DangerousCommandPolicy {
    fn default() -> Self {
        Self {
            patterns: vec![
                r"rm\s+-rf\s+/".to_string(),
                r"rm\s+-rf\s+~".to_string(),
                r":\(\)\{.*\|.*&.*\};:".to_string(),
                r"mkfs\.".to_string(),
                r">\s*/dev/sd[a-z]".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteExistingFilePolicy {
    pub allowed_prefixes: Vec<String>,
}

impl Default for WriteExistingFilePolicy {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec![".sisyphus/".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelWriterPolicy {
    pub max_concurrent_writers: u32,
}

impl Default for ParallelWriterPolicy {
    fn default() -> Self {
        Self {
            max_concurrent_writers: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchFreshnessPolicy {
    pub max_behind: u32,
}

impl Default for BranchFreshnessPolicy {
    fn default() -> Self {
        Self { max_behind: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrBodyEvidencePolicy {
    pub require_validation_section: bool,
}

impl Default for PrBodyEvidencePolicy {
    fn default() -> Self {
        Self {
            require_validation_section: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMergeSyncPolicy {
    pub require_delete_branch: bool,
}

impl Default for PostMergeSyncPolicy {
    fn default() -> Self {
        Self {
            require_delete_branch: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsDriftPolicy {
    pub source_patterns: Vec<String>,
    pub docs_patterns: Vec<String>,
}

impl Default for DocsDriftPolicy {
    fn default() -> Self {
        Self {
            source_patterns: vec![r"^src/.*\.rs$".to_string()],
            docs_patterns: vec![r"^docs/".to_string(), r"README".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConformancePolicy {
    pub protected_branches: Vec<String>,
}

impl Default for WorkflowConformancePolicy {
    fn default() -> Self {
        Self {
            protected_branches: vec!["main".to_string(), "master".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GhChecksMergePolicy {
    pub require_approval: bool,
    pub block_on_pending_checks: bool,
}

impl Default for GhChecksMergePolicy {
    fn default() -> Self {
        Self {
            require_approval: true,
            block_on_pending_checks: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoninteractiveShellPolicy {
    pub interactive_patterns: Vec<String>,
    pub required_env_prefix: String,
}

impl Default for NoninteractiveShellPolicy {
    fn default() -> Self {
        Self {
            interactive_patterns: vec![
                r"^git\s+rebase\s+-i\b".to_string(),
                r"^git\s+add\s+-p\b".to_string(),
                r"\bvim\b".to_string(),
                r"\bnano\b".to_string(),
            ],
            required_env_prefix: "GIT_PAGER=cat CI=true ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubagentQuestionBlockerPolicy {
    pub session_pattern: String,
}

impl Default for SubagentQuestionBlockerPolicy {
    fn default() -> Self {
        Self {
            session_pattern: r"-subagent-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksTodowriteDisablerPolicy {
    pub enabled: bool,
}

impl Default for TasksTodowriteDisablerPolicy {
    fn default() -> Self {
        Self { enabled: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardsPolicy {
    pub secret_patterns: Vec<String>,
    pub dangerous_command: DangerousCommandPolicy,
    pub write_existing_file: WriteExistingFilePolicy,
    pub parallel_writer: ParallelWriterPolicy,
    pub branch_freshness: BranchFreshnessPolicy,
    pub pr_body_evidence: PrBodyEvidencePolicy,
    pub post_merge_sync: PostMergeSyncPolicy,
    pub docs_drift: DocsDriftPolicy,
    pub workflow_conformance: WorkflowConformancePolicy,
    pub gh_checks_merge: GhChecksMergePolicy,
    pub noninteractive_shell: NoninteractiveShellPolicy,
    pub subagent_question_blocker: SubagentQuestionBlockerPolicy,
    pub tasks_todowrite_disabler: TasksTodowriteDisablerPolicy,
    pub fail_open_on_error: bool,
}

impl Default for GuardsPolicy {
    fn default() -> Self {
        Self {
            secret_patterns: vec![
                r"(?i)-----BEGIN [A-Z ]*PRIVATE KEY-----".to_string(),
                r"(?i)aws_secret_access_key".to_string(),
                r"sk-[A-Za-z0-9]{20,}".to_string(),
            ],
            dangerous_command: DangerousCommandPolicy::default(),
            write_existing_file: WriteExistingFilePolicy::default(),
            parallel_writer: ParallelWriterPolicy::default(),
            branch_freshness: BranchFreshnessPolicy::default(),
            pr_body_evidence: PrBodyEvidencePolicy::default(),
            post_merge_sync: PostMergeSyncPolicy::default(),
            docs_drift: DocsDriftPolicy::default(),
            workflow_conformance: WorkflowConformancePolicy::default(),
            gh_checks_merge: GhChecksMergePolicy::default(),
            noninteractive_shell: NoninteractiveShellPolicy::default(),
            subagent_question_blocker: SubagentQuestionBlockerPolicy::default(),
            tasks_todowrite_disabler: TasksTodowriteDisablerPolicy::default(),
            fail_open_on_error: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMarkerMode {
    Marker,
    Status,
    Both,
}

impl Default for GuardMarkerMode {
    fn default() -> Self {
        GuardMarkerMode::Marker
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardVerbosity {
    Minimal,
    Normal,
    Verbose,
}

impl Default for GuardVerbosity {
    fn default() -> Self {
        GuardVerbosity::Normal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextMonitorPolicy {
    pub reminder_cooldown_tool_calls: u32,
    pub min_token_delta_for_reminder: u64,
    pub guard_marker_mode: GuardMarkerMode,
    pub guard_verbosity: GuardVerbosity,
    pub warn_threshold: f64,
    pub critical_threshold: f64,
    pub min_tokens_for_compaction: u64,
}

impl Default for ContextMonitorPolicy {
    fn default() -> Self {
        Self {
            reminder_cooldown_tool_calls: 5,
            min_token_delta_for_reminder: 2000,
            guard_marker_mode: GuardMarkerMode::Marker,
            guard_verbosity: GuardVerbosity::Normal,
            warn_threshold: 0.85,
            critical_threshold: 0.95,
            min_tokens_for_compaction: 50_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessPressurePolicy {
    pub warning_max_rss_mb: u64,
    pub armed_max_rss_mb: u64,
    pub critical_max_rss_mb: u64,
    pub auto_pause_on_critical: bool,
}

impl Default for ProcessPressurePolicy {
    fn default() -> Self {
        Self {
            warning_max_rss_mb: 6144,
            armed_max_rss_mb: 8192,
            critical_max_rss_mb: 10240,
            auto_pause_on_critical: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRetryPolicy {
    pub max_backoff_ms: u64,
}

impl Default for ProviderRetryPolicy {
    fn default() -> Self {
        Self {
            max_backoff_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMapsPolicy {
    pub max_session_state_entries: usize,
}

impl Default for SessionMapsPolicy {
    fn default() -> Self {
        Self {
            max_session_state_entries: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodexHeaderInjectorPolicy {
    pub model_patterns: Vec<String>,
    pub header: String,
}

impl Default for CodexHeaderInjectorPolicy {
    fn default() -> Self {
        Self {
            model_patterns: vec![r"(?i)codex".to_string(), r"(?i)gpt-5".to_string()],
            header: "<codex-environment>Operating inside the autopilot gateway.</codex-environment>\n\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderCooldownPolicy {
    pub cooldown_tool_calls: u32,
}

impl Default for ReminderCooldownPolicy {
    fn default() -> Self {
        Self {
            cooldown_tool_calls: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecoveryPolicy {
    pub recoverable_patterns: Vec<String>,
}

impl Default for SessionRecoveryPolicy {
    fn default() -> Self {
        Self {
            recoverable_patterns: vec![
                r"(?i)connection reset".to_string(),
                r"(?i)timeout".to_string(),
                r"(?i)temporarily unavailable".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryPolicy {
    pub codex_header_injector: CodexHeaderInjectorPolicy,
    pub plan_handoff_reminder: ReminderCooldownPolicy,
    pub mode_transition_reminder: ReminderCooldownPolicy,
    pub todoread_cadence_reminder: ReminderCooldownPolicy,
    pub session_recovery: SessionRecoveryPolicy,
}

impl Default for AdvisoryPolicy {
    fn default() -> Self {
        Self {
            codex_header_injector: CodexHeaderInjectorPolicy::default(),
            plan_handoff_reminder: ReminderCooldownPolicy::default(),
            mode_transition_reminder: ReminderCooldownPolicy::default(),
            todoread_cadence_reminder: ReminderCooldownPolicy {
                cooldown_tool_calls: 15,
            },
            session_recovery: SessionRecoveryPolicy::default(),
        }
    }
}

/// The fully merged, immutable configuration surface. Hooks and the
/// registry only ever hold `Arc<Policy>`/`&Policy`; nothing mutates a
/// `Policy` after [`Policy::from_document`] returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub hooks: HooksPolicy,
    pub audit: AuditPolicy,
    pub loop_policy: LoopPolicy,
    pub collector: CollectorPolicy,
    pub guards: GuardsPolicy,
    pub context_monitor: ContextMonitorPolicy,
    pub process_pressure: ProcessPressurePolicy,
    pub provider_retry: ProviderRetryPolicy,
    pub session_maps: SessionMapsPolicy,
    pub advisory: AdvisoryPolicy,
    #[serde(skip, default = "default_true")]
    _frozen: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            hooks: HooksPolicy::default(),
            audit: AuditPolicy::default(),
            loop_policy: LoopPolicy::default(),
            collector: CollectorPolicy::default(),
            guards: GuardsPolicy::default(),
            context_monitor: ContextMonitorPolicy::default(),
            process_pressure: ProcessPressurePolicy::default(),
            provider_retry: ProviderRetryPolicy::default(),
            session_maps: SessionMapsPolicy::default(),
            advisory: AdvisoryPolicy::default(),
            _frozen: true,
        }
    }
}

impl Policy {
    /// Parse a TOML document into a `Policy`, normalizing any
    /// out-of-range or unrecognized field to its documented default
    /// instead of rejecting the whole document.
    pub fn from_document(mut policy: Policy) -> Policy {
        if policy.collector.max_chars == 0 {
            tracing::warn!("policy.collector.max_chars was 0, normalizing to default");
            policy.collector.max_chars = CollectorPolicy::default().max_chars;
        }
        if policy.guards.parallel_writer.max_concurrent_writers == 0 {
            tracing::warn!(
                "policy.guards.parallel_writer.max_concurrent_writers was 0, normalizing to default"
            );
            policy.guards.parallel_writer.max_concurrent_writers =
                ParallelWriterPolicy::default().max_concurrent_writers;
        }
        if policy.audit.max_bytes == 0 {
            tracing::warn!("policy.audit.max_bytes was 0, normalizing to default");
            policy.audit.max_bytes = AuditPolicy::default().max_bytes;
        }
        if policy.session_maps.max_session_state_entries == 0 {
            tracing::warn!(
                "policy.session_maps.max_session_state_entries was 0, normalizing to default"
            );
            policy.session_maps.max_session_state_entries =
                SessionMapsPolicy::default().max_session_state_entries;
        }
        if !(0.0..1.0).contains(&policy.context_monitor.warn_threshold) {
            tracing::warn!("policy.context_monitor.warn_threshold out of range, normalizing");
            policy.context_monitor.warn_threshold = ContextMonitorPolicy::default().warn_threshold;
        }
        if !(0.0..=1.0).contains(&policy.context_monitor.critical_threshold) {
            tracing::warn!("policy.context_monitor.critical_threshold out of range, normalizing");
            policy.context_monitor.critical_threshold =
                ContextMonitorPolicy::default().critical_threshold;
        }
        policy._frozen = true;
        policy
    }

    /// Load and normalize a `Policy` from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Policy, PolicyError> {
        let content = std::fs::read_to_string(path)?;
        let parsed: Policy = toml::from_str(&content)?;
        Ok(Policy::from_document(parsed))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("io error reading policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in policy file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_hooks_enabled() {
        let policy = Policy::default();
        assert!(policy.hooks.enabled);
        assert_eq!(policy.loop_policy.max_ignored_completion_cycles, 2);
        assert!(!policy.loop_policy.bootstrap_from_runtime);
    }

    #[test]
    fn absent_fields_fall_back_to_defaults() {
        let doc: Policy = toml::from_str(
            r#"
            [hooks]
            disabled = ["some-hook"]
            "#,
        )
        .unwrap();
        let policy = Policy::from_document(doc);
        assert_eq!(policy.hooks.disabled, vec!["some-hook".to_string()]);
        assert!(policy.hooks.enabled);
        assert_eq!(policy.collector.max_chars, 8000);
    }

    #[test]
    fn invalid_field_is_normalized_not_rejected() {
        let doc: Policy = toml::from_str(
            r#"
            [collector]
            max_chars = 0
            "#,
        )
        .unwrap();
        let policy = Policy::from_document(doc);
        assert_eq!(policy.collector.max_chars, 8000);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "[hooks]\nenabled = false").unwrap();
        let policy = Policy::load(file.path()).unwrap();
        assert!(!policy.hooks.enabled);
    }
}
