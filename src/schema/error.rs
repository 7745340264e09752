use thiserror::Error;

/// Fatal schema-registration failures. These abort startup; they are never
/// surfaced to a request.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate model name: {0}")]
    DuplicateModel(String),

    #[error("duplicate custom type name: {0}")]
    DuplicateCustomType(String),

    #[error("duplicate operation name: {0}")]
    DuplicateOperation(String),

    #[error("duplicate field '{field}' in {target}")]
    DuplicateField { target: String, field: String },

    #[error("duplicate index '{index}' on model '{model}'")]
    DuplicateIndex { model: String, index: String },

    #[error("index '{index}' on model '{model}' references unknown field '{field}'")]
    UnknownIndexField {
        model: String,
        index: String,
        field: String,
    },

    #[error("condition on {target} references unknown field '{field}'")]
    UnknownConditionField { target: String, field: String },

    #[error("operation '{operation}' returns unresolved type '{reference}'")]
    UnresolvedReturnType {
        operation: String,
        reference: String,
    },

    #[error("default value for field '{field}' in {target} does not match its declared type")]
    DefaultTypeMismatch { target: String, field: String },

    #[error("enum domain on non-string field '{field}' in {target}")]
    EnumOnNonString { target: String, field: String },

    #[error("failed to parse schema document: {0}")]
    Parse(String),
}

/// Lookup failure for a model or operation name. A client error, not a
/// schema defect.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: {name}")]
pub struct NotFoundError {
    pub kind: &'static str,
    pub name: String,
}

impl NotFoundError {
    pub fn model(name: impl Into<String>) -> Self {
        Self {
            kind: "model",
            name: name.into(),
        }
    }

    pub fn operation(name: impl Into<String>) -> Self {
        Self {
            kind: "operation",
            name: name.into(),
        }
    }

    pub fn custom_type(name: impl Into<String>) -> Self {
        Self {
            kind: "custom type",
            name: name.into(),
        }
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self {
            kind: "record",
            name: name.into(),
        }
    }
}
