use serde::{Deserialize, Serialize};

/// Roles understood by the generative-text service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Roles that can appear in the on-screen transcript. `AppError` is
/// display-only and never reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptRole {
    System,
    User,
    Assistant,
    AppError,
}

impl From<Role> for TranscriptRole {
    fn from(role: Role) -> Self {
        match role {
            Role::System => TranscriptRole::System,
            Role::User => TranscriptRole::User,
            Role::Assistant => TranscriptRole::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Assistant, content)
    }

    pub fn app_error(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::AppError, content)
    }
}
