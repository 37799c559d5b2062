//! File store port - on-demand access to uploaded artifact content.
//!
//! The transport layer stores the artifact and hands the core a descriptor;
//! the core reads the content back by its assigned name when ingesting.
//! Storage location policy belongs to the implementation.

use async_trait::async_trait;
use thiserror::Error;

/// Descriptor of an uploaded artifact as supplied by the file transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Storage-assigned name, used to address the content.
    pub assigned_name: String,

    /// File name as uploaded by the client.
    pub original_name: String,

    /// Declared media type.
    pub mime_type: String,

    /// Content size in bytes.
    pub size_bytes: u64,
}

impl FileDescriptor {
    pub fn new(
        assigned_name: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            assigned_name: assigned_name.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }
}

/// Errors that can occur reading stored file content.
#[derive(Debug, Clone, Error)]
pub enum FileStoreError {
    #[error("File not found: {name}")]
    NotFound { name: String },

    #[error("Invalid file name: {name}")]
    InvalidName { name: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl FileStoreError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

/// Port for reading uploaded artifact content by assigned name.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Reads the full content addressed by `assigned_name` as text.
    async fn read_to_string(&self, assigned_name: &str) -> Result<String, FileStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn FileStore) {}
    }

    #[test]
    fn descriptor_carries_transport_fields() {
        let descriptor = FileDescriptor::new("a1b2c3", "contacts.csv", "text/csv", 512);
        assert_eq!(descriptor.assigned_name, "a1b2c3");
        assert_eq!(descriptor.original_name, "contacts.csv");
        assert_eq!(descriptor.size_bytes, 512);
    }

    #[test]
    fn file_store_error_displays_name() {
        let err = FileStoreError::not_found("a1b2c3");
        assert!(err.to_string().contains("a1b2c3"));
    }
}
