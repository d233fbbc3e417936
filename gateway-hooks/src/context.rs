//! The per-dispatch context every hook runs against.

use crate::audit::{AuditRecord, AuditSink, AuditStage};
use crate::collector::PendingContextCollector;
use crate::decision::GuardRejection;
use crate::host_api::HostApi;
use crate::policy::Policy;
use crate::process_sampler::{ProcessSampler, SystemProcessSampler};
use crate::state_store::StateStore;
use crate::stop_guard::{LoopStopGuard, StopGuard};
use gateway_protocol::{Event, GatewayState};
use std::sync::Arc;

/// Shared, process-wide collaborators every hook is handed alongside the
/// mutable event. Cheaply cloned (everything behind an `Arc`).
#[derive(Clone)]
pub struct GatewayRuntime {
    pub policy: Arc<Policy>,
    pub collector: Arc<PendingContextCollector>,
    pub audit: Arc<AuditSink>,
    pub host: Arc<dyn HostApi>,
    pub process_sampler: Arc<dyn ProcessSampler>,
    pub stop_guard: Arc<dyn StopGuard>,
}

impl GatewayRuntime {
    pub fn new(policy: Arc<Policy>, audit: Arc<AuditSink>, host: Arc<dyn HostApi>) -> Self {
        Self {
            policy,
            collector: Arc::new(PendingContextCollector::new()),
            audit,
            host,
            process_sampler: Arc::new(SystemProcessSampler::new()),
            stop_guard: Arc::new(LoopStopGuard),
        }
    }

    pub fn with_process_sampler(mut self, sampler: Arc<dyn ProcessSampler>) -> Self {
        self.process_sampler = sampler;
        self
    }

    pub fn with_stop_guard(mut self, stop_guard: Arc<dyn StopGuard>) -> Self {
        self.stop_guard = stop_guard;
        self
    }
}

/// A single hook invocation's view of the world: the mutable event it may
/// rewrite, plus the shared runtime collaborators.
pub struct HookContext<'a> {
    pub event: &'a mut Event,
    pub runtime: &'a GatewayRuntime,
}

impl<'a> HookContext<'a> {
    pub fn new(event: &'a mut Event, runtime: &'a GatewayRuntime) -> Self {
        Self { event, runtime }
    }

    pub fn directory(&self) -> &str {
        &self.event.directory
    }

    pub fn session_id(&self) -> Option<String> {
        self.event.resolve_session_id()
    }

    pub fn policy(&self) -> &Policy {
        &self.runtime.policy
    }

    pub fn collector(&self) -> &PendingContextCollector {
        &self.runtime.collector
    }

    pub fn host(&self) -> &dyn HostApi {
        self.runtime.host.as_ref()
    }

    pub fn load_state(&self) -> Option<GatewayState> {
        StateStore::load(self.directory())
    }

    /// Record an audit entry if the sink is enabled.
    pub fn audit(&self, hook: &str, stage: AuditStage, reason_code: &str) {
        self.runtime
            .audit
            .write(&AuditRecord::new(hook, stage, reason_code));
    }

    pub fn audit_with(&self, record: AuditRecord) {
        self.runtime.audit.write(&record);
    }

    /// Build and write a guard rejection's audit record, then return the
    /// rejection for the hook to propagate.
    pub fn reject(&self, hook: &str, reason_code: &'static str, message: impl Into<String>) -> GuardRejection {
        let rejection = GuardRejection::new(reason_code, message);
        self.audit(hook, AuditStage::Skip, reason_code);
        rejection
    }
}
