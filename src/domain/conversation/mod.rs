//! Conversation aggregate - a conversation together with its owned messages,
//! treated as one consistency boundary.

mod aggregate;
mod message_list;
mod status;

pub use aggregate::{Conversation, MAX_TITLE_LENGTH};
pub use message_list::{MessageList, MessageSnapshot, Representation};
pub use status::ConversationStatus;
