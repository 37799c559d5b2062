//! Document store port - the generic storage adapter.
//!
//! Collection-keyed create/find/update/delete/count operations over JSON
//! documents, with no business logic. The store assigns each inserted
//! document an opaque key under [`INTERNAL_ID_FIELD`]; the response
//! normalizer rewrites that key to the public `id` field before documents
//! cross the application boundary.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Field name under which the store records its internal key.
pub const INTERNAL_ID_FIELD: &str = "_id";

/// Equality filter over top-level document fields. An empty filter matches
/// every document in the collection.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates an empty filter (matches all).
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition on a top-level field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// The equality conditions in insertion order.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether a document satisfies every condition.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Multi-key sort specification. Later keys break ties on earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Sort {
    keys: Vec<(String, SortOrder)>,
}

impl Sort {
    /// Starts a sort on one field.
    pub fn by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            keys: vec![(field.into(), order)],
        }
    }

    /// Adds a tie-breaking key.
    pub fn then(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.keys.push((field.into(), order));
        self
    }

    /// The sort keys in priority order.
    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }
}

/// Options for a `find` query.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort specification; unsorted (storage order) when absent.
    pub sort: Option<Sort>,

    /// Number of matching documents to skip.
    pub skip: u64,

    /// Maximum number of documents to return; unbounded when absent.
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Options for a sorted page.
    pub fn page(sort: Sort, skip: u64, limit: u64) -> Self {
        Self {
            sort: Some(sort),
            skip,
            limit: Some(limit),
        }
    }

    /// Options returning all matches in the given order.
    pub fn sorted(sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            skip: 0,
            limit: None,
        }
    }
}

/// Errors surfaced by document store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    /// The operation did not complete within its deadline.
    #[error("Storage operation '{operation}' timed out")]
    Timeout { operation: String },

    /// The given id is not a valid storage key.
    #[error("Invalid document id: {id}")]
    InvalidId { id: String },

    /// A document could not be encoded or decoded.
    #[error("Document serialization error: {message}")]
    Serialization { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId { id: id.into() }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// Generic document storage, the sole shared resource of the core.
///
/// # Contract
///
/// - `insert` assigns the document key and returns the stored document with
///   [`INTERNAL_ID_FIELD`] populated
/// - `update_by_id` sets the given top-level fields; a `null` patch value
///   removes the field; the updated document is returned, `None` if absent
/// - `find` and `count` over the same filter observe a consistent enough
///   snapshot that a count never undercuts a concurrently fetched page
///   under non-mutating conditions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, assigning its key.
    async fn insert(&self, collection: &str, doc: Value) -> Result<Value, StoreError>;

    /// Fetches one document by key. Returns `None` when absent.
    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Finds documents matching the filter, honoring sort/skip/limit.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError>;

    /// Counts all documents matching the filter.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Sets the given top-level fields on one document.
    ///
    /// Returns the updated document, or `None` when absent.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError>;

    /// Deletes one document by key. Returns whether a document was removed.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn DocumentStore) {}
    }

    #[test]
    fn empty_filter_matches_any_document() {
        let filter = Filter::all();
        assert!(filter.matches(&json!({"owner": "u1"})));
    }

    #[test]
    fn filter_matches_on_field_equality() {
        let filter = Filter::all().eq("owner", "u1");
        assert!(filter.matches(&json!({"owner": "u1", "title": "T"})));
        assert!(!filter.matches(&json!({"owner": "u2"})));
        assert!(!filter.matches(&json!({"title": "T"})));
    }

    #[test]
    fn filter_requires_all_conditions() {
        let filter = Filter::all().eq("owner", "u1").eq("status", "active");
        assert!(filter.matches(&json!({"owner": "u1", "status": "active"})));
        assert!(!filter.matches(&json!({"owner": "u1", "status": "ended"})));
    }

    #[test]
    fn sort_accumulates_tie_breaking_keys() {
        let sort = Sort::by("started_at", SortOrder::Desc).then("_id", SortOrder::Desc);
        assert_eq!(sort.keys().len(), 2);
        assert_eq!(sort.keys()[0].0, "started_at");
        assert_eq!(sort.keys()[1].0, "_id");
    }

    #[test]
    fn find_options_page_sets_window() {
        let options = FindOptions::page(Sort::by("timestamp", SortOrder::Asc), 20, 10);
        assert_eq!(options.skip, 20);
        assert_eq!(options.limit, Some(10));
        assert!(options.sort.is_some());
    }

    #[test]
    fn store_error_displays_context() {
        let err = StoreError::timeout("find");
        assert!(err.to_string().contains("find"));

        let err = StoreError::invalid_id("abc");
        assert!(err.to_string().contains("abc"));
    }
}
