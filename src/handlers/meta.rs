//! Registry introspection: the definitions exactly as registered.

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/meta - summary of registered models and operations
pub async fn meta_index(State(state): State<AppState>) -> ApiResult<Value> {
    let mut models: Vec<&str> = state.registry.models().map(|m| m.name.as_str()).collect();
    models.sort_unstable();
    let mut operations: Vec<&str> = state
        .registry
        .operations()
        .map(|o| o.name.as_str())
        .collect();
    operations.sort_unstable();

    Ok(ApiResponse::success(json!({
        "models": models,
        "operations": operations,
    })))
}

/// GET /api/meta/:model - full definition of one model
pub async fn model_get(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> ApiResult<Value> {
    let model_def = state.registry.model(&model)?;
    Ok(ApiResponse::success(json!(model_def)))
}
