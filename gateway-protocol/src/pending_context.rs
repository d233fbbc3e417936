//! Pending-context entry shape (deferred text awaiting injection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Injection priority; entries merge in this order (critical first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// A single deferred piece of context, scoped to a session and keyed by
/// `(source, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingContextEntry {
    pub source: String,
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl PendingContextEntry {
    pub fn key(&self) -> (String, String) {
        (self.source.clone(), self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_critical_first() {
        let mut priorities = vec![Priority::Low, Priority::Critical, Priority::Normal, Priority::High];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![Priority::Critical, Priority::High, Priority::Normal, Priority::Low]
        );
    }
}
