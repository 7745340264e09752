//! The rule evaluator: given a session, a rule set, a requested operation,
//! and (optionally) a candidate record, decide Allow or Deny.
//!
//! Rules combine by logical OR: any matching rule is independently
//! sufficient. The evaluator is pure and deterministic; rules are stored in
//! an ordered list but evaluation is an unordered `any`, so order can never
//! become priority.

use thiserror::Error;

use crate::auth::Session;
use crate::schema::types::{
    ActorClassifier, AuthorizationRule, Condition, ConditionOp, Operation,
};
use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(self) -> bool {
        self == Decision::Allow
    }
}

/// A Deny outcome surfaced to a caller
#[derive(Debug, Clone, Error)]
#[error("not authorized to {operation:?} {target}")]
pub struct AuthorizationError {
    pub target: String,
    pub operation: Operation,
}

pub fn authorize(
    session: Option<&Session>,
    rules: &[AuthorizationRule],
    operation: Operation,
    record: Option<&Record>,
) -> Decision {
    // Deny is the default: an empty rule set grants nothing
    if rules
        .iter()
        .any(|rule| rule_matches(rule, session, operation, record))
    {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

fn rule_matches(
    rule: &AuthorizationRule,
    session: Option<&Session>,
    operation: Operation,
    record: Option<&Record>,
) -> bool {
    if !rule.operations.contains(&operation) {
        return false;
    }
    if let Some(condition) = &rule.condition {
        // No record exists yet at create time, so conditional rules cannot
        // gate create
        if operation == Operation::Create {
            return false;
        }
        let Some(record) = record else {
            return false;
        };
        if !condition_holds(condition, record) {
            return false;
        }
    }
    actor_matches(&rule.actor, session, operation, record)
}

fn actor_matches(
    actor: &ActorClassifier,
    session: Option<&Session>,
    operation: Operation,
    record: Option<&Record>,
) -> bool {
    match actor {
        ActorClassifier::PublicKey => {
            matches!(session, Some(s) if !s.is_token())
        }
        ActorClassifier::AuthenticatedUser => token_session(session).is_some(),
        ActorClassifier::Group(name) => {
            token_session(session).is_some_and(|s| s.groups.iter().any(|g| g == name))
        }
        ActorClassifier::Owner => {
            let Some(session) = token_session(session) else {
                return false;
            };
            match operation {
                // The creator becomes the owner, so any token session may
                // match an Owner rule for create
                Operation::Create => true,
                _ => record
                    .and_then(|r| r.owner_id.as_deref())
                    .is_some_and(|owner| owner == session.subject),
            }
        }
    }
}

fn token_session<'a>(session: Option<&'a Session>) -> Option<&'a Session> {
    session.filter(|s| s.is_token())
}

fn condition_holds(condition: &Condition, record: &Record) -> bool {
    let actual = record.field(&condition.field);
    match condition.op {
        ConditionOp::Eq => actual.as_ref() == Some(&condition.value),
        // An absent field is treated as not holding either way: Ne requires
        // a present, different value
        ConditionOp::Ne => matches!(actual, Some(v) if v != condition.value),
    }
}
