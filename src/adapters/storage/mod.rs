//! Filesystem storage adapters.

mod local_file_store;

pub use local_file_store::LocalFileStore;
