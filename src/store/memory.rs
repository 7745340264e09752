//! In-memory storage backend. The default collaborator for local development
//! and the test suite; production deployments wire a real backend behind
//! [`RecordStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Record, RecordStore, StoreError};
use crate::planner::{IndexPlan, QueryPredicate};

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, HashMap<Uuid, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, model: &str, id: Uuid) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(model).and_then(|m| m.get(&id)).cloned())
    }

    async fn query(
        &self,
        model: &str,
        plan: &IndexPlan,
        predicate: &QueryPredicate,
    ) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(model, ?plan, "executing planned query");
        let records = self.records.read().await;
        let Some(table) = records.get(model) else {
            return Ok(Vec::new());
        };
        // No physical indexes here; the predicate is applied directly. The
        // plan still matters to callers: unplannable queries never reach us.
        let mut matches: Vec<Record> = table
            .values()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect();
        matches.sort_by_key(|r| (r.created_at, r.id));
        Ok(matches)
    }

    async fn insert(&self, model: &str, record: Record) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        records
            .entry(model.to_string())
            .or_default()
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        model: &str,
        id: Uuid,
        changes: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(model)
            .and_then(|m| m.get_mut(&id))
            .ok_or(StoreError::NotFound)?;
        record.apply_update(changes);
        Ok(record.clone())
    }

    async fn delete(&self, model: &str, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let removed = records.get_mut(model).and_then(|m| m.remove(&id));
        if removed.is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(owner: &str, title: &str) -> Record {
        let mut fields = Map::new();
        fields.insert("title".into(), json!(title));
        Record::new(Some(owner.to_string()), fields)
    }

    #[tokio::test]
    async fn insert_fetch_update_delete() {
        let store = MemoryStore::new();
        let inserted = store.insert("Post", record("user-1", "hello")).await.unwrap();

        let fetched = store.fetch("Post", inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched.field("title"), Some(json!("hello")));

        let mut changes = Map::new();
        changes.insert("title".into(), json!("updated"));
        let updated = store.update("Post", inserted.id, changes).await.unwrap();
        assert_eq!(updated.field("title"), Some(json!("updated")));

        store.delete("Post", inserted.id).await.unwrap();
        assert!(store.fetch("Post", inserted.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete("Post", inserted.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn query_applies_predicate() {
        let store = MemoryStore::new();
        store.insert("Post", record("user-1", "one")).await.unwrap();
        store.insert("Post", record("user-2", "two")).await.unwrap();

        let predicate = crate::planner::parse_predicate(&json!({ "owner_id": "user-1" })).unwrap();
        let results = store
            .query("Post", &IndexPlan::PrimaryKey, &predicate)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field("title"), Some(json!("one")));
    }
}
