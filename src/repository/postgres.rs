//! PostgreSQL document store
//!
//! Documents live in a single `documents` table as JSONB. A trigger calls
//! `pg_notify` on every write and a background listener re-publishes those
//! notifications to local subscribers, so changes made by other server
//! instances reach them too.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgListener, PgPool},
    types::Json,
    Postgres, QueryBuilder, Row,
};
use tokio::sync::broadcast;

use super::{
    ChangeEvent, Collection, DocumentStore, Filter, FilterOp, CHANGE_CHANNEL_CAPACITY,
};
use crate::error::AppResult;

/// Notification channel used by the `documents` trigger
pub const NOTIFY_CHANNEL: &str = "document_changes";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl PgStore {
    /// Create the store and start forwarding change notifications
    pub fn new(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        tokio::spawn(forward_notifications(pool.clone(), changes.clone()));
        Self { pool, changes }
    }
}

async fn forward_notifications(pool: PgPool, changes: broadcast::Sender<ChangeEvent>) {
    let mut listener = match PgListener::connect_with(&pool).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to open change listener: {}", e);
            return;
        }
    };
    if let Err(e) = listener.listen(NOTIFY_CHANNEL).await {
        tracing::error!("Failed to LISTEN on {}: {}", NOTIFY_CHANNEL, e);
        return;
    }
    tracing::info!("Listening for document changes");

    loop {
        match listener.recv().await {
            Ok(notification) => {
                match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                    Ok(event) => {
                        let _ = changes.send(event);
                    }
                    Err(e) => tracing::warn!("Ignoring malformed change payload: {}", e),
                }
            }
            Err(e) => {
                // PgListener reconnects on the next recv
                tracing::warn!("Change listener error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match (filter.op, &filter.value) {
        (FilterOp::Eq, Value::Null) => {
            builder.push(" AND COALESCE(body -> ");
            builder.push_bind(filter.field.clone());
            builder.push(", 'null'::jsonb) = 'null'::jsonb");
        }
        (FilterOp::Eq, value) => {
            builder.push(" AND body @> jsonb_build_object(");
            builder.push_bind(filter.field.clone());
            builder.push("::text, ");
            builder.push_bind(Json(value.clone()));
            builder.push("::jsonb)");
        }
        (op, value) => {
            let cmp = if op == FilterOp::Gte { " >= " } else { " <= " };
            match value {
                Value::Number(n) => {
                    builder.push(" AND (body ->> ");
                    builder.push_bind(filter.field.clone());
                    builder.push(")::double precision");
                    builder.push(cmp);
                    builder.push_bind(n.as_f64().unwrap_or_default());
                }
                Value::String(s) => {
                    builder.push(" AND (body ->> ");
                    builder.push_bind(filter.field.clone());
                    builder.push(")");
                    builder.push(cmp);
                    builder.push_bind(s.clone());
                }
                // Ordering on other JSON types never matches
                _ => {
                    builder.push(" AND FALSE");
                }
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Value>> {
        let row: Option<Json<Value>> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(body)| body))
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (collection, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(body))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, collection: Collection, filters: &[Filter]) -> AppResult<Vec<Value>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());
        for filter in filters {
            push_filter(&mut builder, filter);
        }
        builder.push(" ORDER BY id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let Json(body): Json<Value> = row.try_get("body")?;
                Ok(body)
            })
            .collect()
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
