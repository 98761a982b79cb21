use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("endpoint answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("endpoint returned no completion text")]
    EmptyResponse,
    #[error("collaborator is not configured: {0}")]
    Config(String),
}

/// Text generation service the adapter delegates to.
pub trait Collaborator: Send + Sync {
    fn generate(&self, messages: &[PromptMessage], max_tokens: u32)
    -> Result<String, TransportError>;
}

#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Blocking client for an OpenAI-compatible `chat/completions` endpoint.
pub struct HttpCollaborator {
    settings: HttpSettings,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
}

impl HttpCollaborator {
    pub fn new(settings: HttpSettings) -> Result<Self, TransportError> {
        if settings.endpoint.trim().is_empty() {
            return Err(TransportError::Config("endpoint is empty".to_owned()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, client })
    }
}

impl Collaborator for HttpCollaborator {
    fn generate(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
    ) -> Result<String, TransportError> {
        let body = CompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens,
        };

        let mut request = self.client.post(&self.settings.endpoint).json(&body);
        if let Some(api_key) = &self.settings.api_key {
            request = request.bearer_auth(api_key);
        }

        debug!(
            "posting {} messages to {} (max_tokens {max_tokens})",
            messages.len(),
            self.settings.endpoint
        );
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json()?;
        completion_text(&payload).ok_or(TransportError::EmptyResponse)
    }
}

/// Pulls the generated text out of a completion payload. Accepts the
/// OpenAI `choices` layout and a bare `{"text": ...}` proxy layout.
pub fn completion_text(payload: &Value) -> Option<String> {
    let text = payload
        .pointer("/choices/0/message/content")
        .or_else(|| payload.pointer("/choices/0/text"))
        .or_else(|| payload.get("text"))
        .and_then(Value::as_str)?;

    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn completion_text_reads_known_layouts() {
        let openai = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        assert_eq!(completion_text(&openai).as_deref(), Some("hi"));

        let legacy = json!({"choices": [{"text": "legacy"}]});
        assert_eq!(completion_text(&legacy).as_deref(), Some("legacy"));

        let proxy = json!({"text": "proxied"});
        assert_eq!(completion_text(&proxy).as_deref(), Some("proxied"));

        assert_eq!(completion_text(&json!({"choices": []})), None);
        assert_eq!(completion_text(&json!({"text": "  "})), None);
    }

    #[test]
    fn prompt_roles_serialize_lowercase() {
        let encoded = serde_json::to_value(PromptMessage::system("x")).unwrap();
        assert_eq!(encoded, json!({"role": "system", "content": "x"}));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let result = HttpCollaborator::new(HttpSettings {
            endpoint: " ".to_owned(),
            model: "m".to_owned(),
            api_key: None,
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(result, Err(TransportError::Config(_))));
    }
}
