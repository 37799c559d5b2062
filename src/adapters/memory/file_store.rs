//! In-memory file store for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{FileStore, FileStoreError};

/// In-memory implementation of [`FileStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStore {
    files: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryFileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores content under an assigned name.
    pub async fn put(&self, assigned_name: impl Into<String>, content: impl Into<String>) {
        self.files
            .write()
            .await
            .insert(assigned_name.into(), content.into());
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn read_to_string(&self, assigned_name: &str) -> Result<String, FileStoreError> {
        self.files
            .read()
            .await
            .get(assigned_name)
            .cloned()
            .ok_or_else(|| FileStoreError::not_found(assigned_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_back_stored_content() {
        let store = InMemoryFileStore::new();
        store.put("a1b2", "name\nAda").await;

        let content = store.read_to_string("a1b2").await.unwrap();
        assert_eq!(content, "name\nAda");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let store = InMemoryFileStore::new();
        let result = store.read_to_string("missing").await;
        assert!(matches!(result, Err(FileStoreError::NotFound { .. })));
    }
}
