//! Message store - lifecycle of independently stored message records.
//!
//! Creating a message is two independently committing writes: the message
//! record first, then an idempotent full-list replace of the owning
//! conversation's message list. There is no cross-document transaction; a
//! failure between the writes leaves a read-visible window that is logged.

use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::application::{collections, decode_failure, normalizer::normalize, storage_failure};
use crate::domain::conversation::{MessageList, MessageSnapshot, Representation};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, MessageId, Timestamp};
use crate::domain::message::{Message, Sender};
use crate::ports::{DocumentStore, Filter, FindOptions, Sort, SortOrder, INTERNAL_ID_FIELD};

/// Owns individual message records and keeps the owning conversation's
/// message list reconciled with them.
pub struct MessageStore {
    store: Arc<dyn DocumentStore>,
    representation: Representation,
}

impl MessageStore {
    pub fn new(store: Arc<dyn DocumentStore>, representation: Representation) -> Self {
        Self {
            store,
            representation,
        }
    }

    /// Messages of a conversation, ordered by `timestamp` ascending.
    pub async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, DomainError> {
        let filter = Filter::all().eq("conversation", conversation_id.to_string());
        let sort = Sort::by("timestamp", SortOrder::Asc).then(INTERNAL_ID_FIELD, SortOrder::Asc);

        let docs = self
            .store
            .find(collections::MESSAGES, &filter, &FindOptions::sorted(sort))
            .await
            .map_err(|e| storage_failure("list messages", e))?;

        docs.into_iter()
            .map(|doc| {
                serde_json::from_value(normalize(doc))
                    .map_err(|e| decode_failure("decode message", e))
            })
            .collect()
    }

    /// Persists a message and appends the matching entry to the owning
    /// conversation's list.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if content is empty
    /// - `ConversationNotFound` if the conversation does not exist
    /// - `DatabaseError` if either write fails; the message record may
    ///   already be committed when the list write fails
    pub async fn create(
        &self,
        conversation_id: &ConversationId,
        content: &str,
        author: &str,
    ) -> Result<Message, DomainError> {
        Message::validate_content(content)?;

        let conversation_doc = self
            .store
            .find_by_id(collections::CONVERSATIONS, &conversation_id.to_string())
            .await
            .map_err(|e| storage_failure("load conversation", e))?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ConversationNotFound,
                    format!("Conversation not found: {}", conversation_id),
                )
            })?;

        // The raw author is kept alongside the coarser sender so an embedded
        // snapshot can be matched back to this record on delete.
        let message_doc = json!({
            "conversation": conversation_id.to_string(),
            "sender": Sender::from_author(author),
            "author": author,
            "content": content,
            "timestamp": Timestamp::now(),
        });
        let stored = self
            .store
            .insert(collections::MESSAGES, message_doc)
            .await
            .map_err(|e| storage_failure("insert message", e))?;
        let message: Message = serde_json::from_value(normalize(stored))
            .map_err(|e| decode_failure("decode message", e))?;

        // Second write: replace the conversation's full list. Replaying the
        // same replace is harmless, which makes this step retry-safe.
        let mut list = message_list_of(&conversation_doc);
        match self.representation {
            Representation::Embedded => {
                list.push_snapshot(MessageSnapshot::new(content, author))?
            }
            Representation::Referenced => list.push_reference(*message.id())?,
        }

        let updated = self
            .store
            .update_by_id(
                collections::CONVERSATIONS,
                &conversation_id.to_string(),
                json!({ "messages": list }),
            )
            .await
            .map_err(|e| {
                warn!(
                    message_id = %message.id(),
                    conversation_id = %conversation_id,
                    "message persisted but conversation list update failed"
                );
                storage_failure("append to conversation list", e)
            })?;

        if updated.is_none() {
            warn!(
                message_id = %message.id(),
                conversation_id = %conversation_id,
                "conversation disappeared before its list was updated"
            );
        }

        Ok(message)
    }

    /// Replaces a message's content. Returns `None` when the message is absent.
    pub async fn update(
        &self,
        message_id: &MessageId,
        new_content: &str,
    ) -> Result<Option<Message>, DomainError> {
        Message::validate_content(new_content)?;

        let updated = self
            .store
            .update_by_id(
                collections::MESSAGES,
                &message_id.to_string(),
                json!({ "content": new_content }),
            )
            .await
            .map_err(|e| storage_failure("update message", e))?;

        updated
            .map(|doc| {
                serde_json::from_value(normalize(doc))
                    .map_err(|e| decode_failure("decode message", e))
            })
            .transpose()
    }

    /// Deletes a message and removes the matching entry from the owning
    /// conversation's list. Returns whether a record was removed.
    pub async fn delete(&self, message_id: &MessageId) -> Result<bool, DomainError> {
        let existing = self
            .store
            .find_by_id(collections::MESSAGES, &message_id.to_string())
            .await
            .map_err(|e| storage_failure("load message", e))?;
        let existing = match existing {
            Some(doc) => doc,
            None => return Ok(false),
        };

        let deleted = self
            .store
            .delete_by_id(collections::MESSAGES, &message_id.to_string())
            .await
            .map_err(|e| storage_failure("delete message", e))?;
        if !deleted {
            return Ok(false);
        }

        if let Err(err) = self.reconcile_after_delete(message_id, &existing).await {
            warn!(
                message_id = %message_id,
                error = %err,
                "message deleted but conversation list reconciliation failed"
            );
        }

        Ok(true)
    }

    async fn reconcile_after_delete(
        &self,
        message_id: &MessageId,
        message_doc: &serde_json::Value,
    ) -> Result<(), DomainError> {
        let conversation_id = match message_doc.get("conversation").and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None => return Ok(()),
        };

        let conversation_doc = self
            .store
            .find_by_id(collections::CONVERSATIONS, &conversation_id)
            .await
            .map_err(|e| storage_failure("load conversation", e))?;
        let conversation_doc = match conversation_doc {
            Some(doc) => doc,
            None => return Ok(()),
        };

        let mut list = message_list_of(&conversation_doc);
        let removed = match &list {
            MessageList::Referenced(_) => list.remove_reference(message_id),
            MessageList::Embedded(_) => {
                let content = message_doc
                    .get("content")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let author = message_doc
                    .get("author")
                    .or_else(|| message_doc.get("sender"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                list.remove_snapshot(content, author)
            }
        };

        if removed {
            self.store
                .update_by_id(
                    collections::CONVERSATIONS,
                    &conversation_id,
                    json!({ "messages": list }),
                )
                .await
                .map_err(|e| storage_failure("reconcile conversation list", e))?;
        }

        Ok(())
    }
}

/// Reads the message list out of a conversation document, defaulting to an
/// empty list when the field is absent or unreadable.
pub(crate) fn message_list_of(conversation_doc: &serde_json::Value) -> MessageList {
    conversation_doc
        .get("messages")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::ports::Filter;

    async fn seed_conversation(store: &Arc<dyn DocumentStore>) -> ConversationId {
        let doc = store
            .insert(
                collections::CONVERSATIONS,
                json!({
                    "title": "T",
                    "owner": "u1",
                    "status": "active",
                    "started_at": Timestamp::now(),
                    "messages": [],
                }),
            )
            .await
            .unwrap();
        doc[INTERNAL_ID_FIELD].as_str().unwrap().parse().unwrap()
    }

    fn referenced_store(store: Arc<dyn DocumentStore>) -> MessageStore {
        MessageStore::new(store, Representation::Referenced)
    }

    #[tokio::test]
    async fn create_persists_record_and_appends_reference() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = referenced_store(store.clone());

        let message = messages
            .create(&conversation_id, "hello", "agent")
            .await
            .unwrap();
        assert_eq!(message.sender(), Sender::Agent);

        let conversation = store
            .find_by_id(collections::CONVERSATIONS, &conversation_id.to_string())
            .await
            .unwrap()
            .unwrap();
        let list = message_list_of(&conversation);
        assert_eq!(list.references().unwrap(), &[*message.id()]);
    }

    #[tokio::test]
    async fn create_appends_snapshot_under_embedded_representation() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = MessageStore::new(store.clone(), Representation::Embedded);

        messages.create(&conversation_id, "hi", "u1").await.unwrap();

        let conversation = store
            .find_by_id(collections::CONVERSATIONS, &conversation_id.to_string())
            .await
            .unwrap()
            .unwrap();
        let list = message_list_of(&conversation);
        assert_eq!(
            list.snapshots().unwrap(),
            &[MessageSnapshot::new("hi", "u1")]
        );
    }

    #[tokio::test]
    async fn create_rejects_missing_conversation() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let messages = referenced_store(store);

        let result = messages
            .create(&ConversationId::new(), "hello", "u1")
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::ConversationNotFound);
    }

    #[tokio::test]
    async fn create_rejects_empty_content() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = referenced_store(store);

        let result = messages.create(&conversation_id, "  ", "u1").await;
        assert_eq!(result.unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn list_by_conversation_orders_by_timestamp() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = referenced_store(store);

        messages.create(&conversation_id, "first", "u1").await.unwrap();
        messages.create(&conversation_id, "second", "bot").await.unwrap();

        let listed = messages.list_by_conversation(&conversation_id).await.unwrap();
        let contents: Vec<&str> = listed.iter().map(Message::content).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_conversation() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let first = seed_conversation(&store).await;
        let second = seed_conversation(&store).await;
        let messages = referenced_store(store);

        messages.create(&first, "mine", "u1").await.unwrap();
        messages.create(&second, "other", "u1").await.unwrap();

        let listed = messages.list_by_conversation(&first).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content(), "mine");
    }

    #[tokio::test]
    async fn update_replaces_content() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = referenced_store(store);

        let message = messages.create(&conversation_id, "old", "u1").await.unwrap();
        let updated = messages
            .update(message.id(), "new")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content(), "new");
    }

    #[tokio::test]
    async fn update_missing_message_returns_none() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let messages = referenced_store(store);

        let result = messages.update(&MessageId::new(), "new").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_removes_record_and_reference() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = referenced_store(store.clone());

        let keep = messages.create(&conversation_id, "keep", "u1").await.unwrap();
        let drop = messages.create(&conversation_id, "drop", "u1").await.unwrap();

        assert!(messages.delete(drop.id()).await.unwrap());

        let remaining = store
            .count(collections::MESSAGES, &Filter::all())
            .await
            .unwrap();
        assert_eq!(remaining, 1);

        let conversation = store
            .find_by_id(collections::CONVERSATIONS, &conversation_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            message_list_of(&conversation).references().unwrap(),
            &[*keep.id()]
        );
    }

    #[tokio::test]
    async fn delete_removes_embedded_snapshot() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let conversation_id = seed_conversation(&store).await;
        let messages = MessageStore::new(store.clone(), Representation::Embedded);

        messages.create(&conversation_id, "keep", "u1").await.unwrap();
        let drop = messages.create(&conversation_id, "drop", "u1").await.unwrap();

        assert!(messages.delete(drop.id()).await.unwrap());

        let conversation = store
            .find_by_id(collections::CONVERSATIONS, &conversation_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            message_list_of(&conversation).snapshots().unwrap(),
            &[MessageSnapshot::new("keep", "u1")]
        );
    }

    #[tokio::test]
    async fn delete_missing_message_returns_false() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let messages = referenced_store(store);

        assert!(!messages.delete(&MessageId::new()).await.unwrap());
    }
}
