pub mod memory;
pub mod record;

use async_trait::async_trait;
use serde_json::Map;
use uuid::Uuid;

use crate::planner::{IndexPlan, QueryPredicate};
pub use memory::MemoryStore;
pub use record::Record;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Contract for the external storage collaborator. The engine decides
/// authorization and index selection; all record I/O happens behind this
/// trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch(&self, model: &str, id: Uuid) -> Result<Option<Record>, StoreError>;

    /// Execute a planned query. The plan names the access path the planner
    /// selected; the predicate carries the constraints to apply on it.
    async fn query(
        &self,
        model: &str,
        plan: &IndexPlan,
        predicate: &QueryPredicate,
    ) -> Result<Vec<Record>, StoreError>;

    async fn insert(&self, model: &str, record: Record) -> Result<Record, StoreError>;

    async fn update(
        &self,
        model: &str,
        id: Uuid,
        changes: Map<String, serde_json::Value>,
    ) -> Result<Record, StoreError>;

    async fn delete(&self, model: &str, id: Uuid) -> Result<(), StoreError>;
}
