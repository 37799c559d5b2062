//! Response normalizer - rewrites storage documents into the public shape.
//!
//! Every document leaving the storage layer passes through [`normalize`]
//! before it is deserialized or returned: the internal storage key becomes
//! the public `id` field, an owner reference populated as a full sub-object
//! collapses to its identifier string, and the same key rewrite applies to
//! every nested message object. Normalizing an already-normalized document
//! is a no-op.

use serde_json::Value;

use crate::ports::INTERNAL_ID_FIELD;

/// Normalizes a stored document into its public shape. Idempotent.
pub fn normalize(doc: Value) -> Value {
    let mut map = match doc {
        Value::Object(map) => map,
        other => return other,
    };

    // Internal key -> public id. When both are present the public id wins.
    if let Some(internal) = map.remove(INTERNAL_ID_FIELD) {
        map.entry("id").or_insert(internal);
    }

    // A populated owner sub-object collapses to its identifier.
    if let Some(owner) = map.get("owner") {
        if let Some(owner_obj) = owner.as_object() {
            let owner_id = owner_obj
                .get("id")
                .or_else(|| owner_obj.get(INTERNAL_ID_FIELD))
                .cloned();
            if let Some(owner_id) = owner_id {
                map.insert("owner".to_string(), owner_id);
            }
        }
    }

    // Nested message objects get the same rewrite; reference strings and
    // snapshots without keys pass through unchanged.
    if let Some(Value::Array(messages)) = map.remove("messages") {
        map.insert(
            "messages".to_string(),
            Value::Array(messages.into_iter().map(normalize).collect()),
        );
    }

    Value::Object(map)
}
