//! Field-set validation shared by record input (create/update) and custom
//! operation arguments, which carry the same required/default semantics.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::Field;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    fn new(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        Self {
            message: message.into(),
            field_errors,
        }
    }
}

/// Validate a full input object against a field set: unknown fields are
/// rejected, declared defaults fill omitted optionals, missing required
/// fields and type mismatches fail with per-field detail.
pub fn validate_create_input(
    fields: &[Field],
    input: Value,
) -> Result<Map<String, Value>, ValidationError> {
    let mut map = as_object(input)?;
    let mut errors = HashMap::new();

    reject_unknown(fields, &map, &mut errors);

    for field in fields {
        match map.get(&field.name) {
            None | Some(Value::Null) => {
                if let Some(default) = &field.default {
                    map.insert(field.name.clone(), default.clone());
                } else if field.required {
                    errors.insert(field.name.clone(), "This field is required".to_string());
                } else {
                    map.remove(&field.name);
                }
            }
            Some(value) => {
                if !field.accepts(value) {
                    errors.insert(field.name.clone(), type_error(field));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(map)
    } else {
        Err(ValidationError::new("Invalid input", errors))
    }
}

/// Validate a partial input object: only the supplied fields are checked,
/// no defaults are applied, and a required field cannot be unset.
pub fn validate_update_input(
    fields: &[Field],
    input: Value,
) -> Result<Map<String, Value>, ValidationError> {
    let map = as_object(input)?;
    let mut errors = HashMap::new();

    reject_unknown(fields, &map, &mut errors);

    for field in fields {
        if let Some(value) = map.get(&field.name) {
            if value.is_null() && field.required {
                errors.insert(field.name.clone(), "This field is required".to_string());
            } else if !field.accepts(value) {
                errors.insert(field.name.clone(), type_error(field));
            }
        }
    }

    if errors.is_empty() {
        Ok(map)
    } else {
        Err(ValidationError::new("Invalid input", errors))
    }
}

fn as_object(input: Value) -> Result<Map<String, Value>, ValidationError> {
    match input {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ValidationError::new("Expected a JSON object", HashMap::new())),
    }
}

fn reject_unknown(
    fields: &[Field],
    map: &Map<String, Value>,
    errors: &mut HashMap<String, String>,
) {
    for key in map.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            errors.insert(key.clone(), "Unknown field".to_string());
        }
    }
}

fn type_error(field: &Field) -> String {
    let base = format!("Expected {:?}", field.scalar).to_lowercase();
    if field.array {
        format!("{} array", base)
    } else if let Some(domain) = &field.enum_values {
        format!("{} from {:?}", base, domain)
    } else {
        base
    }
}
