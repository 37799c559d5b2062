//! Local filesystem implementation of the file store.
//!
//! Reads uploaded artifact content from a flat upload directory by the
//! transport-assigned name. Assigned names must be plain file names; path
//! traversal components are rejected.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::ports::{FileStore, FileStoreError};

/// Local filesystem storage for uploaded artifacts.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    base_dir: PathBuf,
}

impl LocalFileStore {
    /// Creates a store rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, assigned_name: &str) -> Result<PathBuf, FileStoreError> {
        let name = Path::new(assigned_name);
        let is_plain_name = name.components().count() == 1
            && matches!(name.components().next(), Some(Component::Normal(_)));
        if !is_plain_name {
            return Err(FileStoreError::invalid_name(assigned_name));
        }
        Ok(self.base_dir.join(name))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read_to_string(&self, assigned_name: &str) -> Result<String, FileStoreError> {
        let path = self.resolve(assigned_name)?;
        fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileStoreError::not_found(assigned_name),
            _ => FileStoreError::io(e.to_string()),
        })
    }
}
