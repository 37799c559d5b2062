//! Message entity - an independently stored message record.
//!
//! Only meaningful under the referenced representation; under the embedded
//! one the conversation's inline snapshots are the read path, but message
//! records are still persisted by the message store so individual messages
//! stay queryable.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp};

/// Originator of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    Agent,
}

impl Sender {
    /// Maps a free-form author string onto a sender.
    ///
    /// "bot" and "agent" map to their senders; anything else (end-user
    /// handles like "u1") is treated as the user side.
    pub fn from_author(author: &str) -> Self {
        match author {
            "bot" => Sender::Bot,
            "agent" => Sender::Agent,
            _ => Sender::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
            Sender::Agent => "agent",
        }
    }
}

/// An individual message record owned by a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Storage-assigned identifier.
    id: MessageId,

    /// Owning conversation key.
    conversation: ConversationId,

    /// Who produced the message.
    sender: Sender,

    /// Message body.
    content: String,

    /// When the message was created.
    timestamp: Timestamp,

    /// Opaque optional payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

impl Message {
    /// Validates message content.
    pub fn validate_content(content: &str) -> Result<(), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation("content", "Content cannot be empty"));
        }
        Ok(())
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }
}
