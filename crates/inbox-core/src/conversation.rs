//! Persona interview conversation messages.
//!
//! The interview transcript is supplied by the extraction collaborator on
//! every turn and stored verbatim on the persona session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the role of a message in an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the operator being interviewed.
    User,
    /// Message from the interviewing assistant.
    Assistant,
    /// System-generated message.
    System,
}

/// A single message in an interview transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Case-insensitive substring match used for evidence counting.
    pub fn mentions(&self, term: &str) -> bool {
        self.content.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Number of messages in `history` that mention `term`.
pub fn count_mentions(history: &[ConversationMessage], term: &str) -> usize {
    history.iter().filter(|m| m.mentions(term)).count()
}
