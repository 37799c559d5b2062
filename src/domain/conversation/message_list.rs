//! The message list of a conversation, in exactly one of two representations.
//!
//! A conversation's messages are stored either as denormalized snapshots
//! (embedded, no independent identity) or as foreign keys into the message
//! store (referenced). The enum makes a mixed list unrepresentable within a
//! single record; which representation a deployment writes is fixed by
//! configuration, not chosen per record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, MessageId};

/// Backing strategy for conversation message lists, chosen once per
/// deployment via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Inline `{text, author}` snapshots with no independent identity.
    Embedded,
    /// Foreign keys into the message store.
    Referenced,
}

/// A denormalized message snapshot stored inline in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub text: String,
    pub author: String,
}

impl MessageSnapshot {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }
}

/// Ordered message list in a single, homogeneous representation.
///
/// Persisted as a plain JSON array: objects for snapshots, id strings for
/// references. An empty list deserializes as `Embedded` and adopts the
/// representation of its first pushed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageList {
    Embedded(Vec<MessageSnapshot>),
    Referenced(Vec<MessageId>),
}

impl MessageList {
    /// Creates an empty list for the given representation.
    pub fn empty(representation: Representation) -> Self {
        match representation {
            Representation::Embedded => MessageList::Embedded(Vec::new()),
            Representation::Referenced => MessageList::Referenced(Vec::new()),
        }
    }

    /// Which representation this list carries.
    pub fn representation(&self) -> Representation {
        match self {
            MessageList::Embedded(_) => Representation::Embedded,
            MessageList::Referenced(_) => Representation::Referenced,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MessageList::Embedded(items) => items.len(),
            MessageList::Referenced(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the snapshots if this list is embedded.
    pub fn snapshots(&self) -> Option<&[MessageSnapshot]> {
        match self {
            MessageList::Embedded(items) => Some(items),
            MessageList::Referenced(_) => None,
        }
    }

    /// Returns the message keys if this list is referenced.
    pub fn references(&self) -> Option<&[MessageId]> {
        match self {
            MessageList::Referenced(ids) => Some(ids),
            MessageList::Embedded(_) => None,
        }
    }

    /// Appends a snapshot. An empty referenced list switches to embedded;
    /// a non-empty referenced list rejects the push to keep the record
    /// homogeneous.
    pub fn push_snapshot(&mut self, snapshot: MessageSnapshot) -> Result<(), DomainError> {
        match self {
            MessageList::Embedded(items) => {
                items.push(snapshot);
                Ok(())
            }
            MessageList::Referenced(ids) if ids.is_empty() => {
                *self = MessageList::Embedded(vec![snapshot]);
                Ok(())
            }
            MessageList::Referenced(_) => Err(mixed_representation()),
        }
    }

    /// Appends a message reference, with the same homogeneity rule as
    /// [`MessageList::push_snapshot`].
    pub fn push_reference(&mut self, id: MessageId) -> Result<(), DomainError> {
        match self {
            MessageList::Referenced(ids) => {
                ids.push(id);
                Ok(())
            }
            MessageList::Embedded(items) if items.is_empty() => {
                *self = MessageList::Referenced(vec![id]);
                Ok(())
            }
            MessageList::Embedded(_) => Err(mixed_representation()),
        }
    }

    /// Removes a reference from the list. Returns whether an entry was removed.
    pub fn remove_reference(&mut self, id: &MessageId) -> bool {
        match self {
            MessageList::Referenced(ids) => {
                let before = ids.len();
                ids.retain(|existing| existing != id);
                ids.len() < before
            }
            MessageList::Embedded(_) => false,
        }
    }

    /// Removes the first snapshot matching `text` and `author`, if any.
    pub fn remove_snapshot(&mut self, text: &str, author: &str) -> bool {
        match self {
            MessageList::Embedded(items) => {
                match items
                    .iter()
                    .position(|s| s.text == text && s.author == author)
                {
                    Some(index) => {
                        items.remove(index);
                        true
                    }
                    None => false,
                }
            }
            MessageList::Referenced(_) => false,
        }
    }
}

impl Default for MessageList {
    fn default() -> Self {
        MessageList::Embedded(Vec::new())
    }
}

fn mixed_representation() -> DomainError {
    DomainError::validation(
        "messages",
        "Message representations cannot be mixed within one conversation",
    )
}
