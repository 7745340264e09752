use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentSession};

/// GET /api/auth/whoami - the resolved identity for this request
pub async fn session_whoami(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> ApiResult<Value> {
    match session {
        Some(session) => Ok(ApiResponse::success(json!({
            "anonymous": false,
            "session": session,
        }))),
        None => Ok(ApiResponse::success(json!({ "anonymous": true }))),
    }
}
