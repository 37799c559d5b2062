//! In-memory document store.
//!
//! Keeps collections as document vectors behind an async RwLock, preserving
//! insertion order as the natural storage order. Useful for testing and
//! development; behavior mirrors the Postgres adapter's contract.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ports::{
    DocumentStore, Filter, FindOptions, Sort, SortOrder, StoreError, INTERNAL_ID_FIELD,
};

/// In-memory implementation of [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all collections (useful for tests).
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, mut doc: Value) -> Result<Value, StoreError> {
        let map = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::serialization("Document must be a JSON object"))?;
        map.insert(
            INTERNAL_ID_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc_id_is(doc, id)).cloned()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let mut matches: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &options.sort {
            matches.sort_by(|a, b| compare_docs(a, b, sort));
        }

        let iter = matches.into_iter().skip(options.skip as usize);
        Ok(match options.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        })
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| StoreError::serialization("Patch must be a JSON object"))?
            .clone();

        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(collection) {
            Some(docs) => docs,
            None => return Ok(None),
        };

        let doc = match docs.iter_mut().find(|doc| doc_id_is(doc, id)) {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let map = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::serialization("Stored document is not an object"))?;
        for (field, value) in patch {
            if value.is_null() {
                map.remove(&field);
            } else {
                map.insert(field, value);
            }
        }

        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(collection) {
            Some(docs) => docs,
            None => return Ok(false),
        };

        let before = docs.len();
        docs.retain(|doc| !doc_id_is(doc, id));
        Ok(docs.len() < before)
    }
}

fn doc_id_is(doc: &Value, id: &str) -> bool {
    doc.get(INTERNAL_ID_FIELD).and_then(Value::as_str) == Some(id)
}

fn compare_docs(a: &Value, b: &Value, sort: &Sort) -> Ordering {
    for (field, order) in sort.keys() {
        let ordering = compare_values(a.get(field), b.get(field));
        let ordering = match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// Missing fields sort first; mixed types fall back to their JSON text form.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_internal_id() {
        let store = InMemoryDocumentStore::new();
        let doc = store.insert("things", json!({"name": "a"})).await.unwrap();

        let id = doc.get(INTERNAL_ID_FIELD).and_then(Value::as_str).unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn insert_rejects_non_object_documents() {
        let store = InMemoryDocumentStore::new();
        let result = store.insert("things", json!([1, 2])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn find_by_id_returns_inserted_document() {
        let store = InMemoryDocumentStore::new();
        let doc = store.insert("things", json!({"name": "a"})).await.unwrap();
        let id = doc[INTERNAL_ID_FIELD].as_str().unwrap();

        let found = store.find_by_id("things", id).await.unwrap().unwrap();
        assert_eq!(found["name"], "a");
    }

    #[tokio::test]
    async fn find_by_id_returns_none_when_absent() {
        let store = InMemoryDocumentStore::new();
        let found = store.find_by_id("things", "missing").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_filters_sorts_and_paginates() {
        let store = InMemoryDocumentStore::new();
        for (owner, rank) in [("u1", 3), ("u1", 1), ("u2", 5), ("u1", 2)] {
            store
                .insert("things", json!({"owner": owner, "rank": rank}))
                .await
                .unwrap();
        }

        let filter = Filter::all().eq("owner", "u1");
        let options = FindOptions::page(Sort::by("rank", SortOrder::Desc), 1, 2);
        let found = store.find("things", &filter, &options).await.unwrap();

        let ranks: Vec<i64> = found.iter().map(|d| d["rank"].as_i64().unwrap()).collect();
        assert_eq!(ranks, vec![2, 1]);
    }

    #[tokio::test]
    async fn sort_breaks_ties_with_secondary_key() {
        let store = InMemoryDocumentStore::new();
        store
            .insert("things", json!({"rank": 1, "name": "b"}))
            .await
            .unwrap();
        store
            .insert("things", json!({"rank": 1, "name": "a"}))
            .await
            .unwrap();

        let sort = Sort::by("rank", SortOrder::Asc).then("name", SortOrder::Asc);
        let found = store
            .find("things", &Filter::all(), &FindOptions::sorted(sort))
            .await
            .unwrap();

        assert_eq!(found[0]["name"], "a");
        assert_eq!(found[1]["name"], "b");
    }

    #[tokio::test]
    async fn count_is_independent_of_pagination() {
        let store = InMemoryDocumentStore::new();
        for i in 0..5 {
            store
                .insert("things", json!({"owner": "u1", "rank": i}))
                .await
                .unwrap();
        }

        let filter = Filter::all().eq("owner", "u1");
        assert_eq!(store.count("things", &filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn update_by_id_sets_fields_and_returns_updated() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert("things", json!({"name": "a", "status": "pending"}))
            .await
            .unwrap();
        let id = doc[INTERNAL_ID_FIELD].as_str().unwrap();

        let updated = store
            .update_by_id("things", id, json!({"status": "processed"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["status"], "processed");
        assert_eq!(updated["name"], "a");
    }

    #[tokio::test]
    async fn update_with_null_removes_field() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert("things", json!({"name": "a", "note": "x"}))
            .await
            .unwrap();
        let id = doc[INTERNAL_ID_FIELD].as_str().unwrap();

        let updated = store
            .update_by_id("things", id, json!({"note": null}))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.get("note").is_none());
    }

    #[tokio::test]
    async fn update_by_id_returns_none_when_absent() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update_by_id("things", "missing", json!({"a": 1}))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_by_id_reports_removal() {
        let store = InMemoryDocumentStore::new();
        let doc = store.insert("things", json!({"name": "a"})).await.unwrap();
        let id = doc[INTERNAL_ID_FIELD].as_str().unwrap();

        assert!(store.delete_by_id("things", id).await.unwrap());
        assert!(!store.delete_by_id("things", id).await.unwrap());
        assert_eq!(store.len("things").await, 0);
    }
}
