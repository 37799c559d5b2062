//! Conversation aggregate entity.
//!
//! A conversation owns its message list; under the referenced representation
//! the list holds keys into the message store, under the embedded one it
//! holds inline snapshots. The persisted document uses the public wire field
//! names (`started_at`, `ended_at`), with the storage key rewritten to `id`
//! by the response normalizer before deserialization.

use serde::{Deserialize, Serialize};

use super::{ConversationStatus, MessageList};
use crate::domain::foundation::{ConversationId, DomainError, Timestamp, UserId};

/// Maximum length for a conversation title.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Conversation aggregate.
///
/// # Invariants
///
/// - `title` is 1-500 characters after trimming
/// - `messages` is homogeneous (enforced by [`MessageList`])
/// - `ended_at` is set exactly when `status` is terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Storage-assigned identifier.
    id: ConversationId,

    /// Conversation title.
    title: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    /// Owning user.
    owner: UserId,

    /// Current lifecycle status.
    #[serde(default)]
    status: ConversationStatus,

    /// When the conversation was started.
    started_at: Timestamp,

    /// Set when the conversation transitions to a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ended_at: Option<Timestamp>,

    /// Ordered message list in one representation.
    #[serde(default)]
    messages: MessageList,
}

impl Conversation {
    /// Creates a new active conversation.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the title is empty or too long
    pub fn new(
        id: ConversationId,
        owner: UserId,
        title: String,
        description: Option<String>,
        messages: MessageList,
    ) -> Result<Self, DomainError> {
        Self::validate_title(&title)?;

        Ok(Self {
            id,
            title,
            description,
            owner,
            status: ConversationStatus::Active,
            started_at: Timestamp::now(),
            ended_at: None,
            messages,
        })
    }

    /// Validates a conversation title.
    pub fn validate_title(title: &str) -> Result<(), DomainError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("title", "Title cannot be empty"));
        }
        if trimmed.len() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(
                "title",
                format!("Title must be {} characters or less", MAX_TITLE_LENGTH),
            ));
        }
        Ok(())
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    pub fn messages(&self) -> &MessageList {
        &self.messages
    }

    /// Checks if the given user owns this conversation.
    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner == user_id
    }
}
