//! Repository layer over a document store
//!
//! Every record is a JSON document in a named collection. Services talk to
//! the typed [`Repository`] facade; the storage engine behind it is any
//! [`DocumentStore`] (PostgreSQL in production, in-memory for tests and
//! local development).

pub mod assignments;
pub mod loans;
pub mod memory;
pub mod postgres;
pub mod requests;
pub mod users;
pub mod weekly_assignments;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Buffered change events per subscriber before it starts lagging
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Named document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Operators,
    Equipment,
    WeeklyAssignments,
    Assignments,
    AssignmentRequests,
    EquipmentLoans,
    Users,
    Admins,
    PushTokens,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Operators => "operators",
            Collection::Equipment => "equipment",
            Collection::WeeklyAssignments => "weeklyAssignments",
            Collection::Assignments => "assignments",
            Collection::AssignmentRequests => "assignmentRequests",
            Collection::EquipmentLoans => "equipmentLoans",
            Collection::Users => "users",
            Collection::Admins => "admins",
            Collection::PushTokens => "pushTokens",
        }
    }

    /// Collections whose changes any signed-in user may follow
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Collection::Operators
                | Collection::Equipment
                | Collection::WeeklyAssignments
                | Collection::Assignments
        )
    }

    /// Human readable record name for error messages
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Operators => "Operator",
            Collection::Equipment => "Equipment",
            Collection::WeeklyAssignments => "Weekly assignment",
            Collection::Assignments => "Assignment",
            Collection::AssignmentRequests => "Assignment request",
            Collection::EquipmentLoans => "Equipment loan",
            Collection::Users => "User",
            Collection::Admins => "Admin",
            Collection::PushTokens => "Push token",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string()))
            .map_err(|_| format!("Unknown collection: {}", s))
    }
}

/// What happened to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Put,
    Delete,
}

/// Notification pushed to subscribers after every committed write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

/// Comparison applied to a top-level document field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

/// Field filter for [`DocumentStore::list`]
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    fn new(field: &str, op: FilterOp, value: impl Serialize) -> Self {
        Self {
            field: field.to_string(),
            op,
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        }
    }

    pub fn eq(field: &str, value: impl Serialize) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn gte(field: &str, value: impl Serialize) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn lte(field: &str, value: impl Serialize) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    /// Evaluate the filter against a document.
    ///
    /// Ordering comparisons work on strings (ISO dates sort lexically) and
    /// numbers; anything else never matches.
    pub fn matches(&self, doc: &Value) -> bool {
        let field = doc.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => field == &self.value,
            FilterOp::Gte | FilterOp::Lte => {
                let ordering = match (field, &self.value) {
                    (Value::String(a), Value::String(b)) => a.as_str().partial_cmp(b.as_str()),
                    (Value::Number(a), Value::Number(b)) => {
                        a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b))
                    }
                    _ => None,
                };
                match (self.op, ordering) {
                    (FilterOp::Gte, Some(o)) => o.is_ge(),
                    (FilterOp::Lte, Some(o)) => o.is_le(),
                    _ => false,
                }
            }
        }
    }
}

/// Storage engine holding the collections
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Value>>;

    /// Insert or replace a document (last writer wins)
    async fn put(&self, collection: Collection, id: &str, body: Value) -> AppResult<()>;

    /// Remove a document, returning whether it existed
    async fn delete(&self, collection: Collection, id: &str) -> AppResult<bool>;

    /// All documents of a collection matching every filter, ordered by id
    async fn list(&self, collection: Collection, filters: &[Filter]) -> AppResult<Vec<Value>>;

    /// Receive every change committed after this call
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;

    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Record type stored in a fixed collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

/// Typed access to the document store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    /// Create a new repository over the given store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn get<T: Document>(&self, id: &str) -> AppResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    /// Like [`Repository::get`] but a missing document is an error
    pub async fn fetch<T: Document>(&self, id: &str) -> AppResult<T> {
        self.get(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} {} not found", T::COLLECTION.label(), id))
        })
    }

    pub async fn put<T: Document>(&self, doc: &T) -> AppResult<()> {
        let body = serde_json::to_value(doc)?;
        self.store.put(T::COLLECTION, doc.id(), body).await
    }

    /// Put a document whose id must not exist yet
    pub async fn insert<T: Document>(&self, doc: &T) -> AppResult<()> {
        if self.store.get(T::COLLECTION, doc.id()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                T::COLLECTION.label(),
                doc.id()
            )));
        }
        self.put(doc).await
    }

    pub async fn list<T: Document>(&self, filters: &[Filter]) -> AppResult<Vec<T>> {
        self.store
            .list(T::COLLECTION, filters)
            .await?
            .into_iter()
            .map(|body| serde_json::from_value(body).map_err(AppError::from))
            .collect()
    }

    /// First document matching the filters
    pub async fn find_one<T: Document>(&self, filters: &[Filter]) -> AppResult<Option<T>> {
        Ok(self.list(filters).await?.into_iter().next())
    }

    pub async fn delete<T: Document>(&self, id: &str) -> AppResult<()> {
        if !self.store.delete(T::COLLECTION, id).await? {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                T::COLLECTION.label(),
                id
            )));
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.store.subscribe()
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_names() {
        assert_eq!(
            serde_json::to_value(Collection::WeeklyAssignments).unwrap(),
            json!("weeklyAssignments")
        );
        assert_eq!("equipmentLoans".parse::<Collection>(), Ok(Collection::EquipmentLoans));
        assert!("loans".parse::<Collection>().is_err());
    }

    #[test]
    fn test_filter_matching() {
        let doc = json!({ "status": "active", "start_date": "2024-01-03", "count": 4 });
        assert!(Filter::eq("status", "active").matches(&doc));
        assert!(!Filter::eq("status", "inactive").matches(&doc));
        assert!(Filter::gte("start_date", "2024-01-03").matches(&doc));
        assert!(!Filter::gte("start_date", "2024-01-04").matches(&doc));
        assert!(Filter::lte("count", 4).matches(&doc));
        assert!(!Filter::lte("missing", "x").matches(&doc));
        assert!(Filter::eq("missing", Option::<String>::None).matches(&doc));
    }
}
