//! PostgreSQL implementation of the document store.
//!
//! Each collection is a table of `(id UUID PRIMARY KEY, doc JSONB)` rows;
//! equality filters use JSONB containment so the GIN indexes apply. Every
//! call runs under a deadline taken from the database configuration.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::ports::{DocumentStore, Filter, FindOptions, StoreError, INTERNAL_ID_FIELD};
use crate::ports::{Sort, SortOrder};

/// PostgreSQL implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PostgresDocumentStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Connects a pool from configuration and optionally runs migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::backend(format!("Failed to connect: {}", e)))?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::backend(format!("Migration failed: {}", e)))?;
        }

        Ok(Self::new(pool, config.statement_timeout()))
    }

    async fn with_deadline<T, F>(&self, operation: &str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                StoreError::backend(format!("Operation '{}' failed: {}", operation, e))
            }),
            Err(_) => Err(StoreError::timeout(operation)),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, collection: &str, mut doc: Value) -> Result<Value, StoreError> {
        let table = table_for(collection)?;
        let id = Uuid::new_v4();

        let map = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::serialization("Document must be a JSON object"))?;
        map.insert(
            INTERNAL_ID_FIELD.to_string(),
            Value::String(id.to_string()),
        );

        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", table);
        self.with_deadline("insert", async {
            sqlx::query(&sql)
                .bind(id)
                .bind(&doc)
                .execute(&self.pool)
                .await
        })
        .await?;

        Ok(doc)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let table = table_for(collection)?;
        let key = parse_id(id)?;

        let sql = format!("SELECT doc FROM {} WHERE id = $1", table);
        let row = self
            .with_deadline("find_by_id", async {
                sqlx::query(&sql).bind(key).fetch_optional(&self.pool).await
            })
            .await?;

        row.map(|row| row.try_get("doc"))
            .transpose()
            .map_err(|e| StoreError::serialization(e.to_string()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let table = table_for(collection)?;
        let order_by = options
            .sort
            .as_ref()
            .map(order_by_clause)
            .transpose()?
            .unwrap_or_default();
        let limit = match options.limit {
            Some(limit) => format!("LIMIT {}", limit),
            None => String::new(),
        };

        let sql = format!(
            "SELECT doc FROM {} WHERE doc @> $1 {} OFFSET $2 {}",
            table, order_by, limit
        );
        let rows = self
            .with_deadline("find", async {
                sqlx::query(&sql)
                    .bind(filter_document(filter))
                    .bind(options.skip as i64)
                    .fetch_all(&self.pool)
                    .await
            })
            .await?;

        rows.into_iter()
            .map(|row| {
                row.try_get("doc")
                    .map_err(|e| StoreError::serialization(e.to_string()))
            })
            .collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let table = table_for(collection)?;

        let sql = format!("SELECT COUNT(*) FROM {} WHERE doc @> $1", table);
        let count: i64 = self
            .with_deadline("count", async {
                sqlx::query_scalar(&sql)
                    .bind(filter_document(filter))
                    .fetch_one(&self.pool)
                    .await
            })
            .await?;

        Ok(count as u64)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let table = table_for(collection)?;
        let key = parse_id(id)?;

        if !patch.is_object() {
            return Err(StoreError::serialization("Patch must be a JSON object"));
        }

        // `null` patch values remove fields; stored documents never carry
        // nulls, so strip_nulls only affects the patched keys.
        let sql = format!(
            "UPDATE {} SET doc = jsonb_strip_nulls(doc || $2) WHERE id = $1 RETURNING doc",
            table
        );
        let row = self
            .with_deadline("update_by_id", async {
                sqlx::query(&sql)
                    .bind(key)
                    .bind(&patch)
                    .fetch_optional(&self.pool)
                    .await
            })
            .await?;

        row.map(|row| row.try_get("doc"))
            .transpose()
            .map_err(|e| StoreError::serialization(e.to_string()))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let table = table_for(collection)?;
        let key = parse_id(id)?;

        let sql = format!("DELETE FROM {} WHERE id = $1", table);
        let result = self
            .with_deadline("delete_by_id", async {
                sqlx::query(&sql).bind(key).execute(&self.pool).await
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Collection names come from application constants; the allowlist keeps
// the formatted SQL closed over known tables.
fn table_for(collection: &str) -> Result<&'static str, StoreError> {
    match collection {
        "conversations" => Ok("conversations"),
        "messages" => Ok("messages"),
        "csv_uploads" => Ok("csv_uploads"),
        other => Err(StoreError::backend(format!(
            "Unknown collection: {}",
            other
        ))),
    }
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::invalid_id(id))
}

fn filter_document(filter: &Filter) -> Value {
    let mut map = Map::new();
    for (field, value) in filter.conditions() {
        map.insert(field.clone(), value.clone());
    }
    Value::Object(map)
}

fn order_by_clause(sort: &Sort) -> Result<String, StoreError> {
    if sort.keys().is_empty() {
        return Ok(String::new());
    }

    let mut terms = Vec::with_capacity(sort.keys().len());
    for (field, order) in sort.keys() {
        if !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StoreError::backend(format!("Invalid sort field: {}", field)));
        }
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let expr = if field == INTERNAL_ID_FIELD {
            "id".to_string()
        } else {
            format!("doc->>'{}'", field)
        };
        terms.push(format!("{} {}", expr, direction));
    }

    Ok(format!("ORDER BY {}", terms.join(", ")))
}
