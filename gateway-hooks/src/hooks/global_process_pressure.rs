//! Samples system-wide process memory pressure on every tool call and
//! escalates through warning -> armed -> critical tiers. On critical, it
//! appends a warning to the tool output and, if configured, force-stops
//! the active continuation loop for the session rather than letting it
//! keep burning memory unattended.

use crate::context::HookContext;
use crate::decision::GuardRejection;
use crate::registry::Hook;
use crate::session_map::SessionRuntimeMap;
use crate::types::{HookMetadata, PRIORITY_LATE};
use async_trait::async_trait;
use gateway_protocol::{EventType, ReasonCode};

pub struct GlobalProcessPressure {
    metadata: HookMetadata,
    critical_events: SessionRuntimeMap<u32>,
}

impl GlobalProcessPressure {
    pub fn new() -> Self {
        Self {
            metadata: HookMetadata::new("global-process-pressure", "Global Process Pressure").with_priority(PRIORITY_LATE),
            critical_events: SessionRuntimeMap::new(512),
        }
    }
}

impl Default for GlobalProcessPressure {
    fn default() -> Self {
        Self::new()
    }
}

enum Tier {
    Nominal,
    Warning,
    Armed,
    Critical,
}

fn classify(max_rss_mb: u64, warning: u64, armed: u64, critical: u64) -> Tier {
    if max_rss_mb >= critical {
        Tier::Critical
    } else if max_rss_mb >= armed {
        Tier::Armed
    } else if max_rss_mb >= warning {
        Tier::Warning
    } else {
        Tier::Nominal
    }
}

#[async_trait]
impl Hook for GlobalProcessPressure {
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
        let sample = ctx.runtime.process_sampler.sample();
        let policy = ctx.policy().process_pressure.clone();
        let tier = classify(sample.max_rss_mb, policy.warning_max_rss_mb, policy.armed_max_rss_mb, policy.critical_max_rss_mb);

        match tier {
            Tier::Nominal => {}
            Tier::Warning => {
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::ProcessPressureWarning.as_str());
            }
            Tier::Armed => {
                ctx.audit(&self.metadata.id, crate::audit::AuditStage::State, ReasonCode::ProcessPressureArmed.as_str());
            }
            Tier::Critical => {
                let count = self.critical_events.get(&session_id).unwrap_or(0) + 1;
                self.critical_events.insert(&session_id, count);

                let output = ctx.event.output.get("output").and_then(|v| v.as_str()).unwrap_or("").to_string();
                let appended = format!("{output}\n\nCritical memory pressure detected; pausing autonomous continuation.");
                if let Some(map) = ctx.event.output.as_object_mut() {
                    map.insert("output".to_string(), serde_json::Value::String(appended));
                }

                if policy.auto_pause_on_critical {
                    ctx.runtime.stop_guard.force_stop(
                        ctx.directory(),
                        &session_id,
                        "continuation_stopped_critical_memory_pressure",
                    );
                }

                ctx.audit_with(
                    crate::audit::AuditRecord::new(
                        &self.metadata.id,
                        crate::audit::AuditStage::State,
                        ReasonCode::GlobalProcessPressureCriticalAppended.as_str(),
                    )
                    .with_field("critical_events_in_window", serde_json::json!(count)),
                );
            }
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
    use crate::process_sampler::{FakeProcessSampler, ProcessSample};
    use crate::stop_guard::FakeStopGuard;
    use gateway_protocol::Event;
    use std::sync::Arc;

    #[tokio::test]
    async fn critical_pressure_appends_warning_and_force_stops() {
        let stop_guard = Arc::new(FakeStopGuard::new());
        let sampler = Arc::new(FakeProcessSampler::new(ProcessSample {
            continue_process_count: 1,
            opencode_process_count: 1,
            max_rss_mb: 11_000,
        }));
        let runtime = GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
        .with_stop_guard(stop_guard.clone())
        .with_process_sampler(sampler);

        let mut event = Event::new("/tmp", EventType::ToolExecuteAfter)
            .with_input(serde_json::json!({"sessionID": "sx"}))
            .with_output(serde_json::json!({"output": "ran"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        GlobalProcessPressure::new().execute(&mut ctx).await.unwrap();

        let output = ctx.event.output.get("output").unwrap().as_str().unwrap();
        assert!(output.contains("Critical memory pressure"));
        assert_eq!(stop_guard.call_count(), 1);
        assert_eq!(stop_guard.calls()[0].2, "continuation_stopped_critical_memory_pressure");
    }

    #[tokio::test]
    async fn nominal_pressure_is_a_noop() {
        let sampler = Arc::new(FakeProcessSampler::new(ProcessSample {
            continue_process_count: 0,
            opencode_process_count: 0,
            max_rss_mb: 100,
        }));
        let runtime = GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
        .with_process_sampler(sampler);

        let mut event = Event::new("/tmp", EventType::ToolExecuteAfter)
            .with_input(serde_json::json!({"sessionID": "sx"}))
            .with_output(serde_json::json!({"output": "ran"}));
        let mut ctx = HookContext::new(&mut event, &runtime);
        GlobalProcessPressure::new().execute(&mut ctx).await.unwrap();
        assert_eq!(ctx.event.output.get("output").unwrap().as_str().unwrap(), "ran");
    }
}
