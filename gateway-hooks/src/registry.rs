//! Hook registry and dispatcher: deterministic routing of events to hooks.

use crate::audit::{AuditRecord, AuditStage};
use crate::context::{GatewayRuntime, HookContext};
use crate::decision::GuardRejection;
use crate::types::{HookMetadata, HookPriority};
use async_trait::async_trait;
use gateway_protocol::{Event, EventType};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Implemented by every hook body. A hook is reentrant-safe under
/// sequential dispatch and owns no cross-event mutable state beyond its
/// own `SessionRuntimeMap`.
#[async_trait]
pub trait Hook: Send + Sync {
    fn metadata(&self) -> &HookMetadata;

    /// The event types this hook wants to see.
    fn events(&self) -> &'static [EventType];

    async fn execute(&self, ctx: &mut HookContext<'_>) -> Result<(), GuardRejection>;
}

/// Central registry: holds every registered hook and resolves, per
/// dispatch, the effective ordered subset for an event type.
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn register(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    fn effective_order(&self, event_type: EventType, policy: &crate::policy::Policy) -> Vec<Arc<dyn Hook>> {
        let applicable: Vec<&Arc<dyn Hook>> = self
            .hooks
            .iter()
            .filter(|h| h.events().contains(&event_type))
            .filter(|h| !policy.hooks.disabled.contains(&h.metadata().id))
            .collect();

        if let Some(order) = &policy.hooks.order {
            order
                .iter()
                .filter_map(|id| applicable.iter().find(|h| &h.metadata().id == id))
                .map(|h| Arc::clone(*h))
                .collect()
        } else {
            let mut sorted = applicable;
            sorted.sort_by(|a, b| {
                a.metadata()
                    .priority
                    .cmp(&b.metadata().priority)
                    .then_with(|| a.metadata().id.cmp(&b.metadata().id))
            });
            sorted.into_iter().map(Arc::clone).collect()
        }
    }

    /// Dispatch `event` through the effective ordered hook list. Returns
    /// the first guard rejection encountered, if any; stops immediately
    /// on rejection without running subsequent hooks.
    pub async fn dispatch(&self, event: &mut Event, runtime: &GatewayRuntime) -> Result<(), GuardRejection> {
        if !runtime.policy.hooks.enabled {
            return Ok(());
        }

        let event_type = event.event_type;
        let ordered = self.effective_order(event_type, &runtime.policy);

        for hook in &ordered {
            tracing::debug!(hook = %hook.metadata().id, event = %event_type.as_str(), "dispatching hook");
            let mut ctx = HookContext::new(event, runtime);
            hook.execute(&mut ctx).await?;
        }

        if runtime.audit.is_enabled() {
            runtime.audit.write(&AuditRecord::new(
                "dispatcher",
                AuditStage::Dispatch,
                "event_dispatch",
            ).with_field("event_type", event_type.as_str()));
        }

        Ok(())
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide registry singleton, mirroring the teacher's `HookManager`
/// global pattern.
pub static HOOK_REGISTRY: Lazy<RwLock<HookRegistry>> = Lazy::new(|| RwLock::new(HookRegistry::new()));

pub async fn register(hook: Arc<dyn Hook>) {
    HOOK_REGISTRY.write().await.register(hook);
}

pub async fn dispatch(event: &mut Event, runtime: &GatewayRuntime) -> Result<(), GuardRejection> {
    HOOK_REGISTRY.read().await.dispatch(event, runtime).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditSink;
    use crate::host_api::FakeHostApi;
    use crate::policy::Policy;
    use crate::types::{HookMetadata, PRIORITY_EARLY, PRIORITY_LATE};

    struct RecordingHook {
        metadata: HookMetadata,
        events: &'static [EventType],
        log: Arc<std::sync::Mutex<Vec<String>>>,
        reject: bool,
    }

    #[async_trait]
    impl Hook for RecordingHook {
        fn metadata(&self) -> &HookMetadata {
            &self.metadata
        }

        fn events(&self) -> &'static [EventType] {
            self.events
        }

        async fn execute(&self, _ctx: &mut HookContext<'_>) -> Result<(), GuardRejection> {
            self.log.lock().unwrap().push(self.metadata.id.clone());
            if self.reject {
                return Err(GuardRejection::new("test_rejection", "rejected"));
            }
            Ok(())
        }
    }

    fn runtime() -> GatewayRuntime {
        GatewayRuntime::new(
            Arc::new(Policy::default()),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        )
    }

    #[tokio::test]
    async fn dispatches_in_priority_then_lexical_order() {
        let mut registry = HookRegistry::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("b-hook", "B").with_priority(PRIORITY_LATE),
            events: &[EventType::ChatMessage],
            log: log.clone(),
            reject: false,
        }));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("a-hook", "A").with_priority(PRIORITY_EARLY),
            events: &[EventType::ChatMessage],
            log: log.clone(),
            reject: false,
        }));

        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ChatMessage);
        registry.dispatch(&mut event, &runtime).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a-hook".to_string(), "b-hook".to_string()]);
    }

    #[tokio::test]
    async fn disabled_hooks_are_excluded() {
        let mut registry = HookRegistry::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("disabled-hook", "D"),
            events: &[EventType::ChatMessage],
            log: log.clone(),
            reject: false,
        }));

        let mut policy = Policy::default();
        policy.hooks.disabled = vec!["disabled-hook".to_string()];
        let runtime = GatewayRuntime::new(
            Arc::new(policy),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        );
        let mut event = Event::new("/tmp", EventType::ChatMessage);
        registry.dispatch(&mut event, &runtime).await.unwrap();

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn guard_rejection_stops_subsequent_hooks() {
        let mut registry = HookRegistry::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("guard", "Guard").with_priority(PRIORITY_EARLY),
            events: &[EventType::ToolExecuteBefore],
            log: log.clone(),
            reject: true,
        }));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("never-runs", "Never").with_priority(PRIORITY_LATE),
            events: &[EventType::ToolExecuteBefore],
            log: log.clone(),
            reject: false,
        }));

        let runtime = runtime();
        let mut event = Event::new("/tmp", EventType::ToolExecuteBefore);
        let result = registry.dispatch(&mut event, &runtime).await;

        assert!(result.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["guard".to_string()]);
    }

    #[tokio::test]
    async fn explicit_order_wins_over_priority() {
        let mut registry = HookRegistry::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("first-by-priority", "First").with_priority(PRIORITY_EARLY),
            events: &[EventType::ChatMessage],
            log: log.clone(),
            reject: false,
        }));
        registry.register(Arc::new(RecordingHook {
            metadata: HookMetadata::new("second-by-priority", "Second").with_priority(PRIORITY_LATE),
            events: &[EventType::ChatMessage],
            log: log.clone(),
            reject: false,
        }));

        let mut policy = Policy::default();
        policy.hooks.order = Some(vec![
            "second-by-priority".to_string(),
            "first-by-priority".to_string(),
        ]);
        let runtime = GatewayRuntime::new(
            Arc::new(policy),
            Arc::new(AuditSink::new("/tmp/does-not-matter", false, 1024, 1)),
            Arc::new(FakeHostApi::new()),
        );
        let mut event = Event::new("/tmp", EventType::ChatMessage);
        registry.dispatch(&mut event, &runtime).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["second-by-priority".to_string(), "first-by-priority".to_string()]
        );
    }
}
