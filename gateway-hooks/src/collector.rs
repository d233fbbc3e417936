//! Session-keyed collector of deferred context awaiting injection.

use chrono::Utc;
use dashmap::DashMap;
use gateway_protocol::{PendingContextEntry, Priority};

const MERGE_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Default)]
pub struct ConsumedPendingContext {
    pub has_content: bool,
    pub merged: String,
    pub entries: Vec<PendingContextEntry>,
}

/// In-memory `sessionId -> Vec<PendingContextEntry>` multimap, deduped by
/// `(source, id)` within a session.
#[derive(Default)]
pub struct PendingContextCollector {
    sessions: DashMap<String, Vec<PendingContextEntry>>,
}

pub struct RegisterRequest {
    pub source: String,
    pub id: String,
    pub content: String,
    pub priority: Priority,
    pub metadata: Option<serde_json::Value>,
}

impl PendingContextCollector {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Trims content; empty inputs are ignored. Replaces any prior entry
    /// with the same `(source, id)`, preserving its original timestamp
    /// unless the priority changed.
    pub fn register(&self, session_id: &str, request: RegisterRequest) {
        let trimmed = request.content.trim();
        if trimmed.is_empty() {
            return;
        }
        let mut bucket = self.sessions.entry(session_id.to_string()).or_default();
        let key = (request.source.clone(), request.id.clone());
        let previous = bucket.iter().find(|existing| existing.key() == key).cloned();
        let timestamp = match &previous {
            Some(prev) if prev.priority == request.priority => prev.timestamp,
            _ => Utc::now(),
        };
        let entry = PendingContextEntry {
            source: request.source,
            id: request.id,
            content: trimmed.to_string(),
            priority: request.priority,
            timestamp,
            metadata: request.metadata,
        };
        bucket.retain(|existing| existing.key() != key);
        bucket.push(entry);
    }

    pub fn has_pending(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .map(|bucket| !bucket.is_empty())
            .unwrap_or(false)
    }

    /// Non-destructive snapshot of a session's pending entries, merged in
    /// priority-then-timestamp order.
    pub fn get_pending(&self, session_id: &str) -> ConsumedPendingContext {
        match self.sessions.get(session_id) {
            Some(bucket) => merge(bucket.clone()),
            None => ConsumedPendingContext::default(),
        }
    }

    /// Destructive read: removes the session's bucket entirely.
    pub fn consume(&self, session_id: &str) -> ConsumedPendingContext {
        match self.sessions.remove(session_id) {
            Some((_, entries)) => merge(entries),
            None => ConsumedPendingContext::default(),
        }
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

fn merge(mut entries: Vec<PendingContextEntry>) -> ConsumedPendingContext {
    if entries.is_empty() {
        return ConsumedPendingContext::default();
    }
    entries.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.timestamp.cmp(&b.timestamp)));
    let merged = entries
        .iter()
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join(MERGE_SEPARATOR);
    ConsumedPendingContext {
        has_content: true,
        merged,
        entries,
    }
}
