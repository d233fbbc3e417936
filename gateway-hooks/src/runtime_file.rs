//! Reads the host-written `autopilot_runtime.json` file, whose schema
//! lives in `gateway_protocol::runtime_file`.

use gateway_protocol::AutopilotRuntimeFile;

pub const RUNTIME_PATH_ENV_VAR: &str = "MY_OPENCODE_AUTOPILOT_RUNTIME_PATH";

pub fn load_runtime_file() -> Option<AutopilotRuntimeFile> {
    let path = std::env::var(RUNTIME_PATH_ENV_VAR).ok()?;
    load_runtime_file_at(&path)
}

pub fn load_runtime_file_at(path: &str) -> Option<AutopilotRuntimeFile> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
