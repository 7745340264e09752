//! Record-level CRUD surface. Handlers validate input against the model's
//! field set, ask the rule evaluator whether the operation may proceed, and
//! delegate all persistence to the storage collaborator.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::format::record_to_api_value;
use crate::app::AppState;
use crate::authz::{authorize, AuthorizationError, Decision};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};
use crate::schema::types::Operation;
use crate::schema::{validate_create_input, validate_update_input, NotFoundError};
use crate::store::Record;

#[derive(Debug, Deserialize)]
pub struct MetaQuery {
    pub meta: Option<bool>,
}

/// POST /api/data/:model - create a record
pub async fn record_post(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let model_def = state.registry.model(&model)?;
    let fields = validate_create_input(&model_def.fields, body)?;

    if authorize(session.as_ref(), &model_def.rules, Operation::Create, None) == Decision::Deny {
        return Err(AuthorizationError {
            target: model.clone(),
            operation: Operation::Create,
        }
        .into());
    }

    // The creating session's subject becomes the owner; key access creates
    // ownerless records
    let owner = session
        .as_ref()
        .filter(|s| s.is_token())
        .map(|s| s.subject.clone());
    let record = state.store.insert(&model, Record::new(owner, fields)).await?;

    Ok(ApiResponse::created(record_to_api_value(
        &record, &model, true,
    )))
}

/// GET /api/data/:model/:id - show single record by id
pub async fn record_get(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Query(query): Query<MetaQuery>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> ApiResult<Value> {
    let model_def = state.registry.model(&model)?;
    let id = parse_record_id(&id)?;

    let record = state
        .store
        .fetch(&model, id)
        .await?
        .ok_or_else(|| ApiError::from(NotFoundError::record(id.to_string())))?;

    if authorize(
        session.as_ref(),
        &model_def.rules,
        Operation::Read,
        Some(&record),
    ) == Decision::Deny
    {
        return Err(AuthorizationError {
            target: model.clone(),
            operation: Operation::Read,
        }
        .into());
    }

    Ok(ApiResponse::success(record_to_api_value(
        &record,
        &model,
        query.meta.unwrap_or(false),
    )))
}

/// PATCH /api/data/:model/:id - partial update of a record
pub async fn record_patch(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let model_def = state.registry.model(&model)?;
    let id = parse_record_id(&id)?;

    let existing = state
        .store
        .fetch(&model, id)
        .await?
        .ok_or_else(|| ApiError::from(NotFoundError::record(id.to_string())))?;

    if authorize(
        session.as_ref(),
        &model_def.rules,
        Operation::Update,
        Some(&existing),
    ) == Decision::Deny
    {
        return Err(AuthorizationError {
            target: model.clone(),
            operation: Operation::Update,
        }
        .into());
    }

    let changes = validate_update_input(&model_def.fields, body)?;
    let record = state.store.update(&model, id, changes).await?;

    Ok(ApiResponse::success(record_to_api_value(
        &record, &model, true,
    )))
}

/// DELETE /api/data/:model/:id - delete a record
pub async fn record_delete(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> ApiResult<()> {
    let model_def = state.registry.model(&model)?;
    let id = parse_record_id(&id)?;

    let existing = state
        .store
        .fetch(&model, id)
        .await?
        .ok_or_else(|| ApiError::from(NotFoundError::record(id.to_string())))?;

    if authorize(
        session.as_ref(),
        &model_def.rules,
        Operation::Delete,
        Some(&existing),
    ) == Decision::Deny
    {
        return Err(AuthorizationError {
            target: model.clone(),
            operation: Operation::Delete,
        }
        .into());
    }

    state.store.delete(&model, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

fn parse_record_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("invalid record id"))
}
