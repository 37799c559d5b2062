//! Ports - boundaries the application layer depends on.

mod document_store;
mod file_store;
mod row_parser;

pub use document_store::{
    DocumentStore, Filter, FindOptions, Sort, SortOrder, StoreError, INTERNAL_ID_FIELD,
};
pub use file_store::{FileDescriptor, FileStore, FileStoreError};
pub use row_parser::{ParseError, RowParser};
