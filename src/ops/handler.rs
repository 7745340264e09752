//! The handler collaborator contract: one externally registered function per
//! custom operation name. Handlers receive validated arguments and the
//! request session; the engine never inspects what they do.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::auth::Session;

/// A failure inside an external handler. The detail is operator-facing; the
/// dispatcher logs it and reports only the error kind to the client.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HandlerFailure(pub String);

#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn execute(
        &self,
        args: Map<String, Value>,
        session: Option<&Session>,
    ) -> Result<Value, HandlerFailure>;
}

/// Registry of handler implementations, keyed by operation name. Populated
/// at startup before the dispatcher is built; read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        operation: impl Into<String>,
        handler: Arc<dyn OperationHandler>,
    ) -> &mut Self {
        let operation = operation.into();
        tracing::debug!(operation = %operation, "registered operation handler");
        self.handlers.insert(operation, handler);
        self
    }

    pub fn get(&self, operation: &str) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(operation).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
