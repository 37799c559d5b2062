//! Domain layer - entities, value objects, and invariants.

pub mod conversation;
pub mod foundation;
pub mod message;
pub mod upload;
