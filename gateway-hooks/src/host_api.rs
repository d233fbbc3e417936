//! The outbound async surface the gateway calls back into the host
//! through. Modeled as a trait so the core and hook bodies can be
//! exercised against a fake in tests; a production binding is wired in by
//! the embedding process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageTokens {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub cache_read: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageInfo {
    pub role: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub tokens: Option<MessageTokens>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub info: MessageInfo,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptBody {
    pub parts: Vec<PromptPart>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostApiError {
    #[error("host api call failed: {0}")]
    Failed(String),

    #[error("host api call timed out")]
    Timeout,
}

/// Every call is potentially blocking; all three methods are `async` so
/// the dispatcher can await them without holding any lock across the call.
#[async_trait]
pub trait HostApi: Send + Sync {
    async fn session_messages(&self, session_id: &str) -> Result<Vec<Message>, HostApiError>;
    async fn session_prompt_async(&self, session_id: &str, body: PromptBody) -> Result<(), HostApiError>;
    async fn session_summarize(&self, session_id: &str) -> Result<(), HostApiError>;
}

/// In-memory fake used throughout the test suite.
#[derive(Default)]
pub struct FakeHostApi {
    pub messages: Mutex<std::collections::HashMap<String, Vec<Message>>>,
    pub prompts: Mutex<Vec<(String, PromptBody)>>,
    pub summarize_calls: Mutex<Vec<String>>,
    pub fail_prompts: Mutex<bool>,
}

impl FakeHostApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_messages(&self, session_id: &str, messages: Vec<Message>) {
        self.messages.lock().unwrap().insert(session_id.to_string(), messages);
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt_text(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, body)| body.parts.first())
            .map(|p| p.text.clone())
    }
}

#[async_trait]
impl HostApi for FakeHostApi {
    async fn session_messages(&self, session_id: &str) -> Result<Vec<Message>, HostApiError> {
        Ok(self.messages.lock().unwrap().get(session_id).cloned().unwrap_or_default())
    }

    async fn session_prompt_async(&self, session_id: &str, body: PromptBody) -> Result<(), HostApiError> {
        if *self.fail_prompts.lock().unwrap() {
            return Err(HostApiError::Failed("fake failure".to_string()));
        }
        self.prompts.lock().unwrap().push((session_id.to_string(), body));
        Ok(())
    }

    async fn session_summarize(&self, session_id: &str) -> Result<(), HostApiError> {
        self.summarize_calls.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_host_api_records_prompts() {
        let host = FakeHostApi::new();
        host.session_prompt_async("s", PromptBody {
            parts: vec![PromptPart::text("hello")],
            agent: None,
            model: None,
        })
        .await
        .unwrap();
        assert_eq!(host.prompt_count(), 1);
        assert_eq!(host.last_prompt_text(), Some("hello".to_string()));
    }

    #[tokio::test]
    async fn fake_host_api_returns_seeded_messages() {
        let host = FakeHostApi::new();
        host.seed_messages(
            "s",
            vec![Message {
                info: MessageInfo {
                    role: "user".to_string(),
                    ..Default::default()
                },
                text: "hi".to_string(),
            }],
        );
        let messages = host.session_messages("s").await.unwrap();
        assert_eq!(messages.len(), 1);
    }
}
