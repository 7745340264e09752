//! The custom operation dispatcher: resolve, validate, authorize, invoke,
//! normalize. Authorization always runs before the handler; a Deny outcome
//! short-circuits and the handler is never called.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

use crate::auth::Session;
use crate::authz::{authorize, Decision};
use crate::schema::{
    validate_create_input, NotFoundError, ReturnShape, SchemaRegistry, ValidationError,
};

use super::handler::HandlerRegistry;

/// Per-invocation lifecycle. No state is ever retried; Failed is terminal
/// and carries the originating error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Received,
    Validated,
    Authorized,
    Dispatched,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not authorized to invoke operation '{0}'")]
    Denied(String),

    /// The handler failed or produced a result outside its declared shape.
    /// Detail is logged for the operator, never sent to the client.
    #[error("operation '{0}' failed")]
    Handler(String),

    #[error("operation '{0}' was cancelled")]
    Cancelled(String),
}

pub struct OperationDispatcher {
    registry: Arc<SchemaRegistry>,
    handlers: HandlerRegistry,
    handler_deadline: Duration,
}

impl OperationDispatcher {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        handlers: HandlerRegistry,
        handler_deadline: Duration,
    ) -> Self {
        Self {
            registry,
            handlers,
            handler_deadline,
        }
    }

    pub async fn invoke(
        &self,
        name: &str,
        raw_args: Value,
        session: Option<&Session>,
    ) -> Result<Value, DispatchError> {
        let mut state = InvocationState::Received;

        let operation = self.registry.operation(name).map_err(|e| {
            fail(name, &mut state, "unknown operation");
            e
        })?;

        let args = validate_create_input(&operation.args, raw_args).map_err(|e| {
            fail(name, &mut state, "argument validation failed");
            e
        })?;
        advance(name, &mut state, InvocationState::Validated);

        // Operations carry no ambient record: ownership checks, if any, are
        // the handler's responsibility after invocation
        let requested = operation.kind.as_operation();
        if authorize(session, &operation.rules, requested, None) == Decision::Deny {
            fail(name, &mut state, "authorization denied");
            return Err(DispatchError::Denied(name.to_string()));
        }
        advance(name, &mut state, InvocationState::Authorized);

        let Some(handler) = self.handlers.get(&operation.handler) else {
            tracing::error!(
                operation = name,
                handler = %operation.handler,
                "no handler registered for operation"
            );
            fail(name, &mut state, "handler missing");
            return Err(DispatchError::Handler(name.to_string()));
        };
        advance(name, &mut state, InvocationState::Dispatched);

        let result = match timeout(self.handler_deadline, handler.execute(args, session)).await {
            Err(_elapsed) => {
                tracing::warn!(operation = name, "handler exceeded deadline, result discarded");
                fail(name, &mut state, "cancelled");
                return Err(DispatchError::Cancelled(name.to_string()));
            }
            Ok(Err(failure)) => {
                tracing::error!(operation = name, detail = %failure, "operation handler failed");
                fail(name, &mut state, "handler error");
                return Err(DispatchError::Handler(name.to_string()));
            }
            Ok(Ok(value)) => value,
        };

        if !self.shape_matches(&operation.returns, &result) {
            tracing::error!(
                operation = name,
                returns = ?operation.returns,
                "handler result does not match declared return shape"
            );
            fail(name, &mut state, "return shape mismatch");
            return Err(DispatchError::Handler(name.to_string()));
        }

        advance(name, &mut state, InvocationState::Completed);
        Ok(result)
    }

    /// Shape check only, not deep value validation: lists must be arrays of
    /// objects, single shapes must be objects carrying the reference type's
    /// required keys.
    fn shape_matches(&self, returns: &ReturnShape, value: &Value) -> bool {
        if returns.is_list() {
            match value.as_array() {
                Some(items) => items.iter().all(|item| self.object_matches(returns, item)),
                None => false,
            }
        } else {
            self.object_matches(returns, value)
        }
    }

    fn object_matches(&self, returns: &ReturnShape, value: &Value) -> bool {
        let Some(object) = value.as_object() else {
            return false;
        };
        match returns {
            ReturnShape::Model(_) | ReturnShape::ModelList(_) => {
                // Stored records always carry their identifier
                object.contains_key("id")
            }
            ReturnShape::Custom(name) | ReturnShape::CustomList(name) => {
                match self.registry.custom_type(name) {
                    Ok(custom) => custom
                        .fields
                        .iter()
                        .filter(|f| f.required)
                        .all(|f| object.contains_key(&f.name)),
                    Err(_) => false,
                }
            }
        }
    }
}

fn advance(operation: &str, state: &mut InvocationState, to: InvocationState) {
    tracing::debug!(operation, from = ?state, to = ?to, "invocation state");
    *state = to;
}

fn fail(operation: &str, state: &mut InvocationState, reason: &str) {
    tracing::debug!(operation, from = ?state, reason, "invocation failed");
    *state = InvocationState::Failed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthMethod, Session};
    use crate::ops::handler::{HandlerFailure, OperationHandler};
    use crate::testing;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        result: Value,
    }

    #[async_trait]
    impl OperationHandler for CountingHandler {
        async fn execute(
            &self,
            _args: Map<String, Value>,
            _session: Option<&Session>,
        ) -> Result<Value, HandlerFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl OperationHandler for FailingHandler {
        async fn execute(
            &self,
            _args: Map<String, Value>,
            _session: Option<&Session>,
        ) -> Result<Value, HandlerFailure> {
            Err(HandlerFailure("backend exploded".into()))
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl OperationHandler for SlowHandler {
        async fn execute(
            &self,
            _args: Map<String, Value>,
            _session: Option<&Session>,
        ) -> Result<Value, HandlerFailure> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!([]))
        }
    }

    fn token_session() -> Session {
        Session {
            subject: "user-1".into(),
            email: None,
            groups: vec![],
            auth: AuthMethod::Token,
        }
    }

    fn dispatcher_with(
        handler: Arc<dyn OperationHandler>,
        deadline: Duration,
    ) -> OperationDispatcher {
        let registry = Arc::new(testing::sample_registry());
        let mut handlers = HandlerRegistry::new();
        handlers.register("search_posts", handler);
        OperationDispatcher::new(registry, handlers, deadline)
    }

    fn search_result() -> Value {
        json!([{ "id": "11111111-1111-1111-1111-111111111111", "title": "hit" }])
    }

    #[tokio::test]
    async fn deny_never_invokes_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_with(
            Arc::new(CountingHandler {
                calls: calls.clone(),
                result: search_result(),
            }),
            Duration::from_secs(5),
        );

        // searchPosts requires an authenticated session
        let err = dispatcher
            .invoke("searchPosts", json!({ "term": "x" }), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Denied(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_required_argument_fails_before_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_with(
            Arc::new(CountingHandler {
                calls: calls.clone(),
                result: search_result(),
            }),
            Duration::from_secs(5),
        );

        let session = token_session();
        let err = dispatcher
            .invoke("searchPosts", json!({}), Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_invocation_returns_handler_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_with(
            Arc::new(CountingHandler {
                calls: calls.clone(),
                result: search_result(),
            }),
            Duration::from_secs(5),
        );

        let session = token_session();
        let result = dispatcher
            .invoke("searchPosts", json!({ "term": "x" }), Some(&session))
            .await
            .unwrap();
        assert_eq!(result, search_result());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_operation_is_not_found() {
        let dispatcher = dispatcher_with(Arc::new(FailingHandler), Duration::from_secs(5));
        let session = token_session();
        let err = dispatcher
            .invoke("nope", json!({}), Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn handler_failure_is_surfaced_without_detail() {
        let dispatcher = dispatcher_with(Arc::new(FailingHandler), Duration::from_secs(5));
        let session = token_session();
        let err = dispatcher
            .invoke("searchPosts", json!({ "term": "x" }), Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert!(!err.to_string().contains("exploded"));
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_deadline_reports_cancelled() {
        let dispatcher = dispatcher_with(Arc::new(SlowHandler), Duration::from_millis(100));
        let session = token_session();
        let err = dispatcher
            .invoke("searchPosts", json!({ "term": "x" }), Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled(_)));
    }

    #[tokio::test]
    async fn result_outside_declared_shape_is_a_handler_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        // searchPosts declares a model list; a bare object is out of shape
        let dispatcher = dispatcher_with(
            Arc::new(CountingHandler {
                calls,
                result: json!({ "unexpected": true }),
            }),
            Duration::from_secs(5),
        );

        let session = token_session();
        let err = dispatcher
            .invoke("searchPosts", json!({ "term": "x" }), Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
    }
}
