//! Planned read surface: parse the filter body into a predicate, select an
//! index path, execute through the storage collaborator, and keep only the
//! records the session may read. Queries no index can serve are rejected;
//! this surface never falls back to a scan.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::records_to_api_values;
use crate::app::AppState;
use crate::authz::{authorize, Decision};
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};
use crate::planner::{parse_predicate, plan_query, QueryPredicate};
use crate::schema::types::Operation;

#[derive(Debug, Default, Deserialize)]
pub struct FindBody {
    #[serde(rename = "where", default)]
    pub where_clause: Option<Value>,
    #[serde(default)]
    pub meta: bool,
}

/// POST /api/find/:model - planned query over a model
pub async fn find_post(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    body: Option<Json<FindBody>>,
) -> ApiResult<Value> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let model_def = state.registry.model(&model)?;

    let predicate = match &body.where_clause {
        Some(where_clause) => parse_predicate(where_clause)?,
        None => QueryPredicate::default(),
    };
    let plan = plan_query(model_def, &predicate)?;
    tracing::debug!(model = %model, plan = ?plan, "query planned");

    let records = state.store.query(&model, &plan, &predicate).await?;

    // Read authorization is per record: conditional rules see each candidate
    let visible: Vec<_> = records
        .into_iter()
        .filter(|record| {
            authorize(
                session.as_ref(),
                &model_def.rules,
                Operation::Read,
                Some(record),
            ) == Decision::Allow
        })
        .collect();

    Ok(ApiResponse::success(json!({
        "plan": plan,
        "records": records_to_api_values(&visible, &model, body.meta),
    })))
}
