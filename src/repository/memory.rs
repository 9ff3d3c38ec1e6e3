//! In-process document store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use super::{ChangeEvent, ChangeKind, Collection, DocumentStore, Filter, CHANGE_CHANNEL_CAPACITY};
use crate::error::AppResult;

/// Document store kept in memory; contents are lost on restart
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, collection: Collection, id: &str, kind: ChangeKind) {
        // No receivers is not an error
        let _ = self.changes.send(ChangeEvent {
            collection,
            id: id.to_string(),
            kind,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> AppResult<()> {
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection)
                .or_default()
                .insert(id.to_string(), body);
        }
        self.notify(collection, id, ChangeKind::Put);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> AppResult<bool> {
        let removed = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(&collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if removed {
            self.notify(collection, id, ChangeKind::Delete);
        }
        Ok(removed)
    }

    async fn list(&self, collection: Collection, filters: &[Filter]) -> AppResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .values()
            .filter(|doc| filters.iter().all(|f| f.matches(doc)))
            .cloned()
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store
            .put(Collection::Operators, "OP-1", json!({ "id": "OP-1", "name": "Rosa" }))
            .await
            .unwrap();

        let doc = store.get(Collection::Operators, "OP-1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Rosa");
        assert!(store.get(Collection::Equipment, "OP-1").await.unwrap().is_none());

        assert!(store.delete(Collection::Operators, "OP-1").await.unwrap());
        assert!(!store.delete(Collection::Operators, "OP-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_by_id() {
        let store = MemoryStore::new();
        for (id, status) in [("b", "active"), ("a", "active"), ("c", "inactive")] {
            store
                .put(Collection::WeeklyAssignments, id, json!({ "id": id, "status": status }))
                .await
                .unwrap();
        }
        let active = store
            .list(Collection::WeeklyAssignments, &[Filter::eq("status", "active")])
            .await
            .unwrap();
        let ids: Vec<&str> = active.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_subscribers_see_committed_writes() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.put(Collection::Equipment, "E1", json!({ "id": "E1" })).await.unwrap();
        store.delete(Collection::Equipment, "E1").await.unwrap();

        let first = changes.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Put);
        assert_eq!(first.collection, Collection::Equipment);
        let second = changes.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Delete);
        assert_eq!(second.id, "E1");
    }
}
