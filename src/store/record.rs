use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored instance of a model: user fields plus system fields. Records are
/// created and destroyed only by the storage collaborator; the engine decides
/// whether a mutation may proceed.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a fresh record for insertion. The owner is the creating
    /// session's subject, when one exists.
    pub fn new(owner_id: Option<String>, fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            created_at: now,
            updated_at: now,
            fields,
        }
    }

    /// Look up a field value, covering the system fields rule conditions and
    /// predicates may reference.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "owner_id" => self.owner_id.as_ref().map(|o| Value::String(o.clone())),
            "created_at" => Some(Value::String(self.created_at.to_rfc3339())),
            "updated_at" => Some(Value::String(self.updated_at.to_rfc3339())),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Merge updated fields and bump the update timestamp.
    pub fn apply_update(&mut self, changes: Map<String, Value>) {
        for (key, value) in changes {
            if value.is_null() {
                self.fields.remove(&key);
            } else {
                self.fields.insert(key, value);
            }
        }
        self.updated_at = Utc::now();
    }
}
