//! In-memory adapters, used by tests and development setups.

mod document_store;
mod file_store;

pub use document_store::InMemoryDocumentStore;
pub use file_store::InMemoryFileStore;
