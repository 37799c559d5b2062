//! Foundation value objects shared across the domain.

mod errors;
mod ids;
mod page;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ConversationId, MessageId, UploadId, UserId};
pub use page::{Page, PageRequest, DEFAULT_PAGE_LIMIT};
pub use timestamp::Timestamp;
