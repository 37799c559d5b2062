//! Conversation lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a conversation. New conversations start `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Ended,
    Escalated,
}

impl ConversationStatus {
    /// Terminal statuses carry an `ended_at` timestamp.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationStatus::Ended | ConversationStatus::Escalated)
    }

    /// Returns the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Ended => "ended",
            ConversationStatus::Escalated => "escalated",
        }
    }
}

impl Default for ConversationStatus {
    fn default() -> Self {
        ConversationStatus::Active
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_is_not_terminal() {
        assert!(!ConversationStatus::Active.is_terminal());
    }

    #[test]
    fn ended_and_escalated_are_terminal() {
        assert!(ConversationStatus::Ended.is_terminal());
        assert!(ConversationStatus::Escalated.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationStatus::Escalated).unwrap();
        assert_eq!(json, "\"escalated\"");
    }

    #[test]
    fn status_deserializes_from_lowercase() {
        let status: ConversationStatus = serde_json::from_str("\"ended\"").unwrap();
        assert_eq!(status, ConversationStatus::Ended);
    }

    #[test]
    fn default_status_is_active() {
        assert_eq!(ConversationStatus::default(), ConversationStatus::Active);
    }
}
