use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

const FINGERPRINT_PREFIX_CHARS: usize = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }
}

/// Cheap identity for a message list: role plus a text prefix per message.
pub fn fingerprint(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| {
            let prefix = message
                .text
                .chars()
                .take(FINGERPRINT_PREFIX_CHARS)
                .collect::<String>();
            format!("{}:{prefix}", message.role.label())
        })
        .collect::<Vec<_>>()
        .join("|")
}

pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| {
            let speaker = match message.role {
                Role::User => "User",
                Role::Model => "Assistant",
            };
            format!("{speaker}: {}", message.text.trim())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fingerprint_ignores_text_past_prefix() {
        let long_a = format!("{}tail one", "x".repeat(FINGERPRINT_PREFIX_CHARS));
        let long_b = format!("{}tail two", "x".repeat(FINGERPRINT_PREFIX_CHARS));

        let a = [ChatMessage::user("Should I move?"), ChatMessage::model(long_a)];
        let b = [ChatMessage::user("Should I move?"), ChatMessage::model(long_b)];
        assert_eq!(fingerprint(&a), fingerprint(&b));

        let c = [ChatMessage::user("Should I move?")];
        assert_ne!(fingerprint(&a), fingerprint(&c));
        assert_eq!(fingerprint(&c), "user:Should I move?");
    }

    #[test]
    fn transcript_labels_speakers() {
        let messages = [ChatMessage::user(" Hi "), ChatMessage::model("Hello")];
        assert_eq!(transcript(&messages), "User: Hi\n\nAssistant: Hello");
    }
}
