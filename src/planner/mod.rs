pub mod predicate;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::types::Model;
use crate::store::Record;

pub use predicate::{parse_predicate, PredicateError};

/// One bound of a range constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bound {
    pub value: Value,
    pub inclusive: bool,
}

/// At most one range constraint per predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeConstraint {
    pub field: String,
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

/// A query shape: equality constraints plus at most one range constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryPredicate {
    pub equals: BTreeMap<String, Value>,
    pub range: Option<RangeConstraint>,
}

impl QueryPredicate {
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.range.is_none()
    }

    /// Whether a record satisfies every constraint. Backends that cannot
    /// push constraints down apply this directly.
    pub fn matches(&self, record: &Record) -> bool {
        for (field, expected) in &self.equals {
            if record.field(field).as_ref() != Some(expected) {
                return false;
            }
        }
        if let Some(range) = &self.range {
            let Some(actual) = record.field(&range.field) else {
                return false;
            };
            if let Some(lower) = &range.lower {
                match compare_values(&actual, &lower.value) {
                    Some(Ordering::Greater) => {}
                    Some(Ordering::Equal) if lower.inclusive => {}
                    _ => return false,
                }
            }
            if let Some(upper) = &range.upper {
                match compare_values(&actual, &upper.value) {
                    Some(Ordering::Less) => {}
                    Some(Ordering::Equal) if upper.inclusive => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

/// Ordering between two JSON scalars of the same kind. Timestamps are RFC3339
/// strings and order lexicographically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// The access path selected for a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IndexPlan {
    /// Direct lookup on the primary identifier
    PrimaryKey,
    /// A secondary index of the model
    SecondaryIndex { index: String, sort_key_used: bool },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// No index can serve the predicate. The caller decides whether to
    /// reject or fall back to a scan; this engine never scans on its own.
    #[error("no index satisfies the query predicate")]
    NoPlanFound,
}

/// Select the access path for a predicate, or report that none exists.
///
/// An index is viable when its partition key is equality-constrained and,
/// if the predicate carries a range, its sort key is the range field.
/// Indexes whose sort key is engaged win over partition-only matches; ties
/// resolve by declaration order, so the choice is deterministic.
pub fn plan_query(model: &Model, predicate: &QueryPredicate) -> Result<IndexPlan, PlanError> {
    let mut best: Option<(u8, IndexPlan)> = None;

    for index in &model.indexes {
        if !predicate.equals.contains_key(&index.partition_key) {
            continue;
        }
        let sort_key_used = match (&predicate.range, &index.sort_key) {
            // A range can only be served by the index sorted on its field
            (Some(range), Some(sort_key)) => {
                if &range.field != sort_key {
                    continue;
                }
                true
            }
            (Some(_), None) => continue,
            (None, Some(sort_key)) => predicate.equals.contains_key(sort_key),
            (None, None) => false,
        };

        let score = if sort_key_used { 2 } else { 1 };
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((
                score,
                IndexPlan::SecondaryIndex {
                    index: index.name.clone(),
                    sort_key_used,
                },
            ));
        }
    }

    if let Some((_, plan)) = best {
        return Ok(plan);
    }

    // Primary-key fallback: only the primary identifier is constrained
    if predicate.range.is_none()
        && predicate.equals.len() == 1
        && predicate.equals.contains_key("id")
    {
        return Ok(IndexPlan::PrimaryKey);
    }

    Err(PlanError::NoPlanFound)
}
