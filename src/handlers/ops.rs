//! Custom operation surface: a thin wrapper over the dispatcher.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};

/// POST /api/ops/:operation - invoke a custom operation
pub async fn invoke_post(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    body: Option<Json<Value>>,
) -> ApiResult<Value> {
    let raw_args = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let result = state
        .dispatcher
        .invoke(&operation, raw_args, session.as_ref())
        .await?;
    Ok(ApiResponse::success(result))
}
