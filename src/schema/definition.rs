//! The declarative schema surface: serde structs for the document loaded at
//! startup. These are parse-time shapes only; the registry converts them into
//! the frozen types in [`crate::schema::types`] and rejects inconsistencies.

use serde::Deserialize;
use serde_json::Value;

use super::error::SchemaError;
use super::types::{ConditionOp, Operation, OperationKind, ScalarType};

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub custom_types: Vec<CustomTypeDef>,
    #[serde(default)]
    pub operations: Vec<CustomOperationDef>,
}

impl SchemaDocument {
    pub fn from_yaml(source: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(source).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Load a document from disk, dispatching on the file extension.
    pub fn load(path: &str) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Parse(format!("{}: {}", path, e)))?;
        if path.ends_with(".json") {
            Self::from_json(&source)
        } else {
            Self::from_yaml(&source)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub scalar: ScalarType,
    #[serde(default)]
    pub array: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<String>>,
}

/// Actor spelling in the document: `owner`, `authenticated`, `public_key`,
/// or `{ group: <name> }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorDef {
    Owner,
    Authenticated,
    PublicKey,
    Group(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleDef {
    pub actor: ActorDef,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub condition: Option<ConditionDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionDef {
    pub field: String,
    #[serde(default = "default_condition_op")]
    pub op: ConditionOp,
    pub value: Value,
}

fn default_condition_op() -> ConditionOp {
    ConditionOp::Eq
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub partition_key: String,
    #[serde(default)]
    pub sort_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomTypeDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomOperationDef {
    pub name: String,
    pub kind: OperationKind,
    #[serde(default)]
    pub args: Vec<FieldDef>,
    pub returns: ReturnDef,
    pub handler: String,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// Return shape spelling: exactly one of `model` / `custom`, plus `list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnDef {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(default)]
    pub list: bool,
}
