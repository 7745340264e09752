//! Parse a JSON filter body into a [`QueryPredicate`]. The accepted language
//! is the subset an index can serve: implicit equality (`{field: value}`),
//! `$eq`, and the range operators `$gt`/`$gte`/`$lt`/`$lte`/`$between` on a
//! single field.

use serde_json::Value;
use thiserror::Error;

use super::{Bound, QueryPredicate, RangeConstraint};

#[derive(Debug, Clone, Error)]
pub enum PredicateError {
    #[error("WHERE must be a JSON object")]
    NotAnObject,

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("operator {op} on '{field}' requires {expected}")]
    InvalidOperand {
        field: String,
        op: String,
        expected: &'static str,
    },

    #[error("at most one range field is allowed (saw '{first}' and '{second}')")]
    MultipleRangeFields { first: String, second: String },

    #[error("conflicting {bound} bounds on '{field}'")]
    ConflictingBounds { field: String, bound: &'static str },
}

pub fn parse_predicate(where_clause: &Value) -> Result<QueryPredicate, PredicateError> {
    let Value::Object(entries) = where_clause else {
        return Err(PredicateError::NotAnObject);
    };

    let mut predicate = QueryPredicate::default();
    for (field, value) in entries {
        if field.starts_with('$') {
            return Err(PredicateError::UnsupportedOperator(field.clone()));
        }
        match value {
            Value::Object(ops) => {
                for (op, operand) in ops {
                    parse_operator(&mut predicate, field, op, operand)?;
                }
            }
            // Implicit equality: { field: value }
            scalar => {
                predicate.equals.insert(field.clone(), scalar.clone());
            }
        }
    }
    Ok(predicate)
}

fn parse_operator(
    predicate: &mut QueryPredicate,
    field: &str,
    op: &str,
    operand: &Value,
) -> Result<(), PredicateError> {
    match op {
        "$eq" => {
            predicate.equals.insert(field.to_string(), operand.clone());
            Ok(())
        }
        "$gt" => set_lower(predicate, field, op, operand, false),
        "$gte" => set_lower(predicate, field, op, operand, true),
        "$lt" => set_upper(predicate, field, op, operand, false),
        "$lte" => set_upper(predicate, field, op, operand, true),
        "$between" => {
            let Some([lo, hi]) = operand.as_array().and_then(|a| <&[Value; 2]>::try_from(a.as_slice()).ok())
            else {
                return Err(PredicateError::InvalidOperand {
                    field: field.to_string(),
                    op: op.to_string(),
                    expected: "a two-element array",
                });
            };
            set_lower(predicate, field, op, lo, true)?;
            set_upper(predicate, field, op, hi, true)
        }
        other => Err(PredicateError::UnsupportedOperator(other.to_string())),
    }
}

fn range_for<'a>(
    predicate: &'a mut QueryPredicate,
    field: &str,
) -> Result<&'a mut RangeConstraint, PredicateError> {
    match &mut predicate.range {
        Some(range) if range.field != field => Err(PredicateError::MultipleRangeFields {
            first: range.field.clone(),
            second: field.to_string(),
        }),
        range => Ok(range.get_or_insert_with(|| RangeConstraint {
            field: field.to_string(),
            lower: None,
            upper: None,
        })),
    }
}

fn set_lower(
    predicate: &mut QueryPredicate,
    field: &str,
    op: &str,
    operand: &Value,
    inclusive: bool,
) -> Result<(), PredicateError> {
    check_scalar(field, op, operand)?;
    let range = range_for(predicate, field)?;
    if range.lower.is_some() {
        return Err(PredicateError::ConflictingBounds {
            field: field.to_string(),
            bound: "lower",
        });
    }
    range.lower = Some(Bound {
        value: operand.clone(),
        inclusive,
    });
    Ok(())
}

fn set_upper(
    predicate: &mut QueryPredicate,
    field: &str,
    op: &str,
    operand: &Value,
    inclusive: bool,
) -> Result<(), PredicateError> {
    check_scalar(field, op, operand)?;
    let range = range_for(predicate, field)?;
    if range.upper.is_some() {
        return Err(PredicateError::ConflictingBounds {
            field: field.to_string(),
            bound: "upper",
        });
    }
    range.upper = Some(Bound {
        value: operand.clone(),
        inclusive,
    });
    Ok(())
}

fn check_scalar(field: &str, op: &str, operand: &Value) -> Result<(), PredicateError> {
    if operand.is_number() || operand.is_string() || operand.is_boolean() {
        Ok(())
    } else {
        Err(PredicateError::InvalidOperand {
            field: field.to_string(),
            op: op.to_string(),
            expected: "a scalar operand",
        })
    }
}
