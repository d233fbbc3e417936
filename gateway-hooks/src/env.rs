//! The closed set of environment variables the gateway reads. Centralized
//! here so the variable names appear exactly once; callers use the typed
//! accessors rather than `std::env::var` directly.

pub const AUDIT_ENABLED: &str = "MY_OPENCODE_GATEWAY_EVENT_AUDIT";
pub const AUDIT_PATH: &str = "MY_OPENCODE_GATEWAY_EVENT_AUDIT_PATH";
pub const AUDIT_MAX_BYTES: &str = "MY_OPENCODE_GATEWAY_EVENT_AUDIT_MAX_BYTES";
pub const AUDIT_MAX_BACKUPS: &str = "MY_OPENCODE_GATEWAY_EVENT_AUDIT_MAX_BACKUPS";
pub const ACTIVE_WRITERS: &str = "MY_OPENCODE_ACTIVE_WRITERS";
pub const FILE_RESERVATION_PATHS: &str = "MY_OPENCODE_FILE_RESERVATION_PATHS";
pub const ACTIVE_RESERVATION_PATHS: &str = "MY_OPENCODE_ACTIVE_RESERVATION_PATHS";
pub const ANTHROPIC_1M_CONTEXT: &str = "ANTHROPIC_1M_CONTEXT";

/// Read an environment variable as a boolean flag; absent or unparseable
/// values are treated as `false` (the documented "off by default" posture).
pub fn flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(false)
}

pub fn numeric(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Parses a comma-separated path list, as used by `MY_OPENCODE_*_PATHS`.
pub fn path_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Builds the audit sink configuration from the environment + a fallback
/// directory for the default path.
pub fn audit_sink_for(directory: &str, max_bytes_default: u64, max_backups_default: u32) -> crate::audit::AuditSink {
    let enabled = flag(AUDIT_ENABLED);
    let path = std::env::var(AUDIT_PATH)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| crate::audit::AuditSink::default_path(directory));
    let max_bytes = numeric(AUDIT_MAX_BYTES).unwrap_or(max_bytes_default);
    let max_backups = numeric(AUDIT_MAX_BACKUPS).unwrap_or(max_backups_default as u64) as u32;
    crate::audit::AuditSink::new(path, enabled, max_bytes, max_backups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn flag_defaults_to_false_when_absent() {
        std::env::remove_var(AUDIT_ENABLED);
        assert!(!flag(AUDIT_ENABLED));
    }

    #[test]
    #[serial]
    fn flag_recognizes_truthy_values() {
        std::env::set_var(AUDIT_ENABLED, "true");
        assert!(flag(AUDIT_ENABLED));
        std::env::remove_var(AUDIT_ENABLED);
    }

    #[test]
    #[serial]
    fn path_list_splits_and_trims() {
        std::env::set_var(FILE_RESERVATION_PATHS, "a/b, c/d ,,e");
        assert_eq!(
            path_list(FILE_RESERVATION_PATHS),
            vec!["a/b".to_string(), "c/d".to_string(), "e".to_string()]
        );
        std::env::remove_var(FILE_RESERVATION_PATHS);
    }
}
