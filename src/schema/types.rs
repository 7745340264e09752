use std::collections::BTreeSet;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Data operations gated by authorization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Id,
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

/// A single field of a model, custom type, or operation argument list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub scalar: ScalarType,
    pub array: bool,
    pub required: bool,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<String>>,
}

impl Field {
    /// Check that a JSON value is compatible with this field's declared type.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return !self.required;
        }
        if self.array {
            match value {
                Value::Array(items) => items.iter().all(|v| self.scalar_accepts(v)),
                _ => false,
            }
        } else {
            self.scalar_accepts(value)
        }
    }

    fn scalar_accepts(&self, value: &Value) -> bool {
        match self.scalar {
            ScalarType::Id => value
                .as_str()
                .map(|s| Uuid::parse_str(s).is_ok())
                .unwrap_or(false),
            ScalarType::String => match value.as_str() {
                Some(s) => match &self.enum_values {
                    Some(domain) => domain.iter().any(|d| d == s),
                    None => true,
                },
                None => false,
            },
            ScalarType::Integer => value.is_i64() || value.is_u64(),
            ScalarType::Float => value.is_number(),
            ScalarType::Boolean => value.is_boolean(),
            ScalarType::Timestamp => value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
        }
    }
}

/// Who a rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorClassifier {
    /// The record's owner (the creator, for create requests)
    Owner,
    /// Any token-authenticated session
    AuthenticatedUser,
    /// Members of a named group
    Group(String),
    /// Requests authenticated with the shared API key
    PublicKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOp {
    Eq,
    Ne,
}

/// A predicate over a candidate record's fields that must hold for a rule to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: ConditionOp,
    pub value: Value,
}

/// One authorization rule. Rules combine by logical OR: any matching rule
/// is independently sufficient for Allow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRule {
    pub actor: ActorClassifier,
    pub operations: BTreeSet<Operation>,
    pub condition: Option<Condition>,
}

/// An alternate access path: partition key plus optional sort key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIndex {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
    pub rules: Vec<AuthorizationRule>,
    pub indexes: Vec<SecondaryIndex>,
}

impl Model {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named return-shape descriptor for custom operations; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomType {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// The data operation a custom operation's rule set is checked against.
    /// Queries read, mutations write.
    pub fn as_operation(self) -> Operation {
        match self {
            OperationKind::Query => Operation::Read,
            OperationKind::Mutation => Operation::Update,
        }
    }
}

/// Declared return shape of a custom operation, resolved at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    Model(String),
    ModelList(String),
    Custom(String),
    CustomList(String),
}

impl ReturnShape {
    pub fn reference(&self) -> &str {
        match self {
            ReturnShape::Model(name)
            | ReturnShape::ModelList(name)
            | ReturnShape::Custom(name)
            | ReturnShape::CustomList(name) => name,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ReturnShape::ModelList(_) | ReturnShape::CustomList(_))
    }
}

/// A named, schema-validated query or mutation routed to an external handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomOperation {
    pub name: String,
    pub kind: OperationKind,
    pub args: Vec<Field>,
    pub returns: ReturnShape,
    pub handler: String,
    pub rules: Vec<AuthorizationRule>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(scalar: ScalarType) -> Field {
        Field {
            name: "f".into(),
            scalar,
            array: false,
            required: true,
            default: None,
            enum_values: None,
        }
    }

    #[test]
    fn scalar_type_checks() {
        assert!(field(ScalarType::String).accepts(&json!("hello")));
        assert!(!field(ScalarType::String).accepts(&json!(42)));
        assert!(field(ScalarType::Integer).accepts(&json!(42)));
        assert!(!field(ScalarType::Integer).accepts(&json!(4.2)));
        assert!(field(ScalarType::Float).accepts(&json!(4.2)));
        assert!(field(ScalarType::Float).accepts(&json!(4)));
        assert!(field(ScalarType::Boolean).accepts(&json!(true)));
        assert!(field(ScalarType::Timestamp).accepts(&json!("2024-01-01T00:00:00Z")));
        assert!(!field(ScalarType::Timestamp).accepts(&json!("yesterday")));
        assert!(field(ScalarType::Id).accepts(&json!("11111111-1111-1111-1111-111111111111")));
        assert!(!field(ScalarType::Id).accepts(&json!("not-a-uuid")));
    }

    #[test]
    fn enum_domain_restricts_strings() {
        let mut f = field(ScalarType::String);
        f.enum_values = Some(vec!["draft".into(), "published".into()]);
        assert!(f.accepts(&json!("draft")));
        assert!(!f.accepts(&json!("archived")));
    }

    #[test]
    fn array_fields_check_every_element() {
        let mut f = field(ScalarType::Integer);
        f.array = true;
        assert!(f.accepts(&json!([1, 2, 3])));
        assert!(!f.accepts(&json!([1, "two"])));
        assert!(!f.accepts(&json!(1)));
    }

    #[test]
    fn null_only_accepted_when_optional() {
        let mut f = field(ScalarType::String);
        assert!(!f.accepts(&Value::Null));
        f.required = false;
        assert!(f.accepts(&Value::Null));
    }
}
