//! Append-only JSONL audit sink with size-triggered rotation.
//!
//! Writes are best-effort: any I/O failure is logged and recorded into
//! `last_error` for tests to inspect, never propagated to a hook.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub hook: String,
    pub stage: AuditStage,
    pub reason_code: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Dispatch,
    Inject,
    Skip,
    State,
}

impl AuditRecord {
    pub fn new(hook: impl Into<String>, stage: AuditStage, reason_code: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            hook: hook.into(),
            stage,
            reason_code: reason_code.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

pub struct AuditSink {
    path: PathBuf,
    enabled: bool,
    max_bytes: u64,
    max_backups: u32,
    last_error: Mutex<Option<String>>,
}

impl AuditSink {
    pub fn new(path: impl Into<PathBuf>, enabled: bool, max_bytes: u64, max_backups: u32) -> Self {
        Self {
            path: path.into(),
            enabled,
            max_bytes,
            max_backups,
            last_error: Mutex::new(None),
        }
    }

    pub fn default_path(directory: &str) -> PathBuf {
        Path::new(directory).join(".opencode").join("gateway-events.jsonl")
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    pub fn write(&self, record: &AuditRecord) {
        if !self.enabled {
            return;
        }
        if let Err(err) = self.write_inner(record) {
            tracing::warn!(error = %err, "audit sink write failed");
            *self.last_error.lock().unwrap() = Some(err.to_string());
        }
    }

    fn write_inner(&self, record: &AuditRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.rotate_if_needed()?;
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> std::io::Result<()> {
        let current_len = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if current_len < self.max_bytes {
            return Ok(());
        }

        for index in (1..self.max_backups).rev() {
            let from = self.backup_path(index);
            let to = self.backup_path(index + 1);
            if from.exists() {
                std::fs::rename(from, to)?;
            }
        }
        if self.max_backups > 0 {
            std::fs::rename(&self.path, self.backup_path(1))?;
        } else {
            std::fs::remove_file(&self.path)?;
        }

        let oldest = self.backup_path(self.max_backups + 1);
        if oldest.exists() {
            std::fs::remove_file(oldest)?;
        }
        Ok(())
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut os_string = self.path.clone().into_os_string();
        os_string.push(format!(".{index}"));
        PathBuf::from(os_string)
    }
}
