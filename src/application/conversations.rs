//! Conversation manager - aggregate lifecycle and message-list consistency.
//!
//! The manager keeps two derived structures consistent with the conversation
//! header: the message list stored on the conversation document and, under
//! the referenced representation, the independent message records the list
//! points at. Writes that touch both commit in two steps; the second step is
//! an idempotent full-list replace so a retry converges instead of
//! duplicating entries.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::application::{collections, decode_failure, normalizer::normalize, storage_failure};
use crate::domain::conversation::{
    Conversation, ConversationStatus, MessageList, MessageSnapshot, Representation,
};
use crate::domain::foundation::{
    ConversationId, DomainError, MessageId, Page, PageRequest, Timestamp, UserId,
};
use crate::domain::message::{Message, Sender};
use crate::ports::{DocumentStore, Filter, FindOptions, Sort, SortOrder, INTERNAL_ID_FIELD};

/// One message supplied by a caller, before it has any storage identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub text: String,
    pub author: String,
}

impl MessageInput {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }
}

/// Input for creating a conversation.
#[derive(Debug, Clone, Default)]
pub struct CreateConversation {
    pub title: String,
    pub description: Option<String>,
    /// Explicit owner; falls back to the acting user when absent.
    pub owner: Option<UserId>,
    pub messages: Vec<MessageInput>,
}

/// Partial update of a conversation. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateConversation {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ConversationStatus>,
    /// Replaces the whole message list when present.
    pub messages: Option<Vec<MessageInput>>,
}

/// A message as returned from a detail read, uniform across both
/// representations. Snapshots have no storage identity or timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMessage {
    pub id: Option<MessageId>,
    pub text: String,
    pub author: String,
    pub timestamp: Option<Timestamp>,
}

/// A conversation together with its fully resolved messages.
#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<ResolvedMessage>,
}

/// Owns the conversation aggregate and its message-list consistency rules.
pub struct ConversationManager {
    store: Arc<dyn DocumentStore>,
    representation: Representation,
    page_limit_cap: u32,
}

impl ConversationManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        representation: Representation,
        page_limit_cap: u32,
    ) -> Self {
        Self {
            store,
            representation,
            page_limit_cap,
        }
    }

    /// Creates a conversation, materializing any initial messages in the
    /// configured representation.
    ///
    /// The header commits first with an empty list; initial messages land in
    /// a second full-list replace. A failure between the two leaves a valid
    /// conversation with a shorter list, never a half-written one.
    pub async fn create(
        &self,
        input: CreateConversation,
        acting_user: &UserId,
    ) -> Result<Conversation, DomainError> {
        Conversation::validate_title(&input.title)?;
        let owner = input.owner.unwrap_or_else(|| acting_user.clone());

        let mut header = Map::new();
        header.insert("title".into(), json!(input.title));
        if let Some(description) = &input.description {
            header.insert("description".into(), json!(description));
        }
        header.insert("owner".into(), json!(owner.as_str()));
        header.insert("status".into(), json!(ConversationStatus::Active));
        header.insert("started_at".into(), json!(Timestamp::now()));
        header.insert("messages".into(), json!([]));

        let mut stored = self
            .store
            .insert(collections::CONVERSATIONS, Value::Object(header))
            .await
            .map_err(|e| storage_failure("insert conversation", e))?;

        if !input.messages.is_empty() {
            let id = internal_id_of(&stored)?;
            let list = self.materialize(&id, &input.messages).await?;
            let updated = self
                .store
                .update_by_id(
                    collections::CONVERSATIONS,
                    &id.to_string(),
                    json!({ "messages": list }),
                )
                .await
                .map_err(|e| storage_failure("attach initial messages", e))?;
            if let Some(doc) = updated {
                stored = doc;
            }
        }

        decode_conversation(stored)
    }

    /// Applies a partial update. Returns `None` when the conversation is
    /// absent.
    ///
    /// A status change to a terminal status stamps `ended_at`; a change back
    /// to active removes it. A `messages` patch replaces the whole list;
    /// under the referenced representation the previously referenced records
    /// are deleted first.
    pub async fn update(
        &self,
        id: &ConversationId,
        patch: UpdateConversation,
    ) -> Result<Option<Conversation>, DomainError> {
        let existing = self
            .store
            .find_by_id(collections::CONVERSATIONS, &id.to_string())
            .await
            .map_err(|e| storage_failure("load conversation", e))?;
        let existing = match existing {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let mut fields = Map::new();
        if let Some(title) = &patch.title {
            Conversation::validate_title(title)?;
            fields.insert("title".into(), json!(title));
        }
        if let Some(description) = &patch.description {
            fields.insert("description".into(), json!(description));
        }
        if let Some(status) = patch.status {
            fields.insert("status".into(), json!(status));
            if status.is_terminal() {
                fields.insert("ended_at".into(), json!(Timestamp::now()));
            } else {
                // Null removes the field, clearing a stale end time.
                fields.insert("ended_at".into(), Value::Null);
            }
        }
        if let Some(inputs) = &patch.messages {
            self.discard_replaced_records(&existing).await;
            let list = self.materialize(id, inputs).await?;
            fields.insert("messages".into(), json!(list));
        }

        if fields.is_empty() {
            return decode_conversation(existing).map(Some);
        }

        let updated = self
            .store
            .update_by_id(
                collections::CONVERSATIONS,
                &id.to_string(),
                Value::Object(fields),
            )
            .await
            .map_err(|e| storage_failure("update conversation", e))?;

        updated.map(decode_conversation).transpose()
    }

    /// Deletes a conversation and, under the referenced representation, all
    /// of its message records. Returns whether a conversation was removed.
    pub async fn delete(&self, id: &ConversationId) -> Result<bool, DomainError> {
        let existing = self
            .store
            .find_by_id(collections::CONVERSATIONS, &id.to_string())
            .await
            .map_err(|e| storage_failure("load conversation", e))?;
        if existing.is_none() {
            return Ok(false);
        }

        // Cascade before the header goes away, so a failure mid-cascade
        // leaves the conversation findable and the delete retryable.
        let filter = Filter::all().eq("conversation", id.to_string());
        let records = self
            .store
            .find(collections::MESSAGES, &filter, &FindOptions::default())
            .await
            .map_err(|e| storage_failure("list messages for cascade", e))?;
        for record in &records {
            if let Some(message_id) = record.get(INTERNAL_ID_FIELD).and_then(|v| v.as_str()) {
                if let Err(err) = self.store.delete_by_id(collections::MESSAGES, message_id).await
                {
                    warn!(
                        conversation_id = %id,
                        message_id,
                        error = %err,
                        "cascade delete of message record failed"
                    );
                }
            }
        }

        self.store
            .delete_by_id(collections::CONVERSATIONS, &id.to_string())
            .await
            .map_err(|e| storage_failure("delete conversation", e))
    }

    /// One conversation with its messages resolved to a uniform shape.
    ///
    /// Referenced entries whose record has gone missing are skipped with a
    /// warning rather than failing the whole read.
    pub async fn find_one(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationDetail>, DomainError> {
        let doc = self
            .store
            .find_by_id(collections::CONVERSATIONS, &id.to_string())
            .await
            .map_err(|e| storage_failure("load conversation", e))?;
        let conversation = match doc {
            Some(doc) => decode_conversation(doc)?,
            None => return Ok(None),
        };

        let messages = match conversation.messages() {
            MessageList::Embedded(snapshots) => snapshots
                .iter()
                .map(|snapshot| ResolvedMessage {
                    id: None,
                    text: snapshot.text.clone(),
                    author: snapshot.author.clone(),
                    timestamp: None,
                })
                .collect(),
            MessageList::Referenced(ids) => {
                let mut resolved = Vec::with_capacity(ids.len());
                for message_id in ids {
                    match self
                        .store
                        .find_by_id(collections::MESSAGES, &message_id.to_string())
                        .await
                        .map_err(|e| storage_failure("load message", e))?
                    {
                        Some(record) => resolved.push(resolve_record(record)?),
                        None => warn!(
                            conversation_id = %id,
                            message_id = %message_id,
                            "referenced message record is missing"
                        ),
                    }
                }
                resolved
            }
        };

        Ok(Some(ConversationDetail {
            conversation,
            messages,
        }))
    }

    /// A page of one user's conversations, most recently started first.
    pub async fn find_all_by_owner(
        &self,
        owner: &UserId,
        request: PageRequest,
    ) -> Result<Page<Conversation>, DomainError> {
        self.find_page(Filter::all().eq("owner", owner.as_str()), request)
            .await
    }

    /// A page of all conversations, most recently started first.
    pub async fn find_all(&self, request: PageRequest) -> Result<Page<Conversation>, DomainError> {
        self.find_page(Filter::all(), request).await
    }

    async fn find_page(
        &self,
        filter: Filter,
        request: PageRequest,
    ) -> Result<Page<Conversation>, DomainError> {
        let request = request.capped(self.page_limit_cap);
        let sort = Sort::by("started_at", SortOrder::Desc).then(INTERNAL_ID_FIELD, SortOrder::Desc);
        let options = FindOptions::page(sort, request.offset(), request.limit() as u64);

        let (docs, total) = tokio::try_join!(
            self.store.find(collections::CONVERSATIONS, &filter, &options),
            self.store.count(collections::CONVERSATIONS, &filter),
        )
        .map_err(|e| storage_failure("page conversations", e))?;

        let conversations = docs
            .into_iter()
            .map(decode_conversation)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(conversations, total))
    }

    /// Turns caller-supplied messages into a list in the configured
    /// representation, inserting message records when referenced.
    async fn materialize(
        &self,
        conversation_id: &ConversationId,
        inputs: &[MessageInput],
    ) -> Result<MessageList, DomainError> {
        let mut list = MessageList::empty(self.representation);
        for input in inputs {
            Message::validate_content(&input.text)?;
            match self.representation {
                Representation::Embedded => {
                    list.push_snapshot(MessageSnapshot::new(&input.text, &input.author))?;
                }
                Representation::Referenced => {
                    let record = self
                        .store
                        .insert(
                            collections::MESSAGES,
                            json!({
                                "conversation": conversation_id.to_string(),
                                "sender": Sender::from_author(&input.author),
                                "author": input.author,
                                "content": input.text,
                                "timestamp": Timestamp::now(),
                            }),
                        )
                        .await
                        .map_err(|e| storage_failure("insert message record", e))?;
                    let message: Message = serde_json::from_value(normalize(record))
                        .map_err(|e| decode_failure("decode message", e))?;
                    list.push_reference(*message.id())?;
                }
            }
        }
        Ok(list)
    }

    /// Deletes the records referenced by a conversation's current list,
    /// ahead of a full-list replace. Failures are logged and skipped; a
    /// leaked record is preferable to failing the update.
    async fn discard_replaced_records(&self, conversation_doc: &Value) {
        let list: MessageList = conversation_doc
            .get("messages")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        let ids = match list.references() {
            Some(ids) => ids.to_vec(),
            None => return,
        };
        for message_id in ids {
            if let Err(err) = self
                .store
                .delete_by_id(collections::MESSAGES, &message_id.to_string())
                .await
            {
                warn!(
                    message_id = %message_id,
                    error = %err,
                    "failed to delete replaced message record"
                );
            }
        }
    }
}

fn decode_conversation(doc: Value) -> Result<Conversation, DomainError> {
    serde_json::from_value(normalize(doc)).map_err(|e| decode_failure("decode conversation", e))
}

fn internal_id_of(doc: &Value) -> Result<ConversationId, DomainError> {
    doc.get(INTERNAL_ID_FIELD)
        .and_then(|v| v.as_str())
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| {
            DomainError::new(
                crate::domain::foundation::ErrorCode::InternalError,
                "Stored conversation is missing its key",
            )
        })
}

fn resolve_record(record: Value) -> Result<ResolvedMessage, DomainError> {
    let record = normalize(record);
    let author = record
        .get("author")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let message: Message =
        serde_json::from_value(record).map_err(|e| decode_failure("decode message", e))?;
    Ok(ResolvedMessage {
        id: Some(*message.id()),
        text: message.content().to_string(),
        author: author.unwrap_or_else(|| message.sender().as_str().to_string()),
        timestamp: Some(*message.timestamp()),
    })
}
