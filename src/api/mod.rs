use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::Role;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body for both `/chat` and `/generate`. Chat requests carry `messages`,
/// completion requests carry `prompt` and optionally `system`.
#[derive(Debug, Serialize, Clone, Default)]
pub struct GenerateRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
}

/// One decoded object from the service. Streaming responses are a sequence
/// of these, one per line.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelTag {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

/// Failures talking to the service outside of a fragment stream.
#[derive(Debug)]
pub enum ApiError {
    InvalidUrl(String),
    Transport(reqwest::Error),
    Status { status: u16, body: String },
    Decode(String),
    Closed,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidUrl(url) => {
                write!(f, "invalid API URL {url:?}: expected http:// or https://")
            }
            ApiError::Transport(err) => write!(f, "could not reach the service: {err}"),
            ApiError::Status { status, body } => {
                write!(f, "service returned status {status}: {body}")
            }
            ApiError::Decode(message) => write!(f, "unexpected response: {message}"),
            ApiError::Closed => write!(f, "API is closed"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

pub mod models;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_omits_completion_fields() {
        let request = GenerateRequest {
            model: "m1".into(),
            messages: vec![ChatMessage::new(Role::User, "hi")],
            stream: true,
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "m1",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true
            })
        );
    }

    #[test]
    fn completion_request_carries_system_field() {
        let request = GenerateRequest {
            model: "m1".into(),
            prompt: Some("why".into()),
            system: Some("be terse".into()),
            stream: false,
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], "why");
        assert_eq!(value["system"], "be terse");
        assert_eq!(value["stream"], false);
        assert!(value.get("messages").is_none());
    }

    #[test]
    fn api_error_messages() {
        let err = ApiError::Status {
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.to_string(), "service returned status 404: not found");
        assert_eq!(ApiError::Closed.to_string(), "API is closed");
        assert!(ApiError::InvalidUrl("localhost".into())
            .to_string()
            .contains("http://"));
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let line = r#"{"model":"m1","created_at":"2024-05-01T10:00:00.123456Z","message":{"role":"assistant","content":"He"},"done":false}"#;
        let parsed: GenerateResponse = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.message.unwrap().content, "He");
        assert!(parsed.created_at.is_some());
        assert!(!parsed.done);
        assert!(parsed.response.is_none());
    }
}
