//! Router assembly. The engine is exposed through a thin Axum surface:
//! session resolution and the route guard run as layers ahead of every
//! handler.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{route_guard_middleware, session_middleware};
use crate::ops::OperationDispatcher;
use crate::schema::SchemaRegistry;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub store: Arc<dyn RecordStore>,
    pub dispatcher: Arc<OperationDispatcher>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Engine surfaces
        .merge(data_routes())
        .merge(find_routes())
        .merge(ops_routes())
        .merge(meta_routes())
        .merge(auth_routes())
        .with_state(state)
        // Guard runs after session resolution, ahead of every handler
        .layer(axum::middleware::from_fn(route_guard_middleware))
        .layer(axum::middleware::from_fn(session_middleware))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn data_routes() -> Router<AppState> {
    use crate::handlers::data;

    Router::new()
        // Collection-level create
        .route("/api/data/:model", post(data::record_post))
        // Record-level operations
        .route(
            "/api/data/:model/:id",
            get(data::record_get)
                .patch(data::record_patch)
                .delete(data::record_delete),
        )
}

fn find_routes() -> Router<AppState> {
    use crate::handlers::find;

    Router::new()
        // Planned queries with filters
        .route("/api/find/:model", post(find::find_post))
}

fn ops_routes() -> Router<AppState> {
    use crate::handlers::ops;

    Router::new()
        // Custom operation dispatch
        .route("/api/ops/:operation", post(ops::invoke_post))
}

fn meta_routes() -> Router<AppState> {
    use crate::handlers::meta;

    Router::new()
        // Registry introspection
        .route("/api/meta", get(meta::meta_index))
        .route("/api/meta/:model", get(meta::model_get))
}

fn auth_routes() -> Router<AppState> {
    use crate::handlers::auth;

    Router::new().route("/api/auth/whoami", get(auth::session_whoami))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Warden API",
            "version": version,
            "description": "Schema-driven authorization and operation-routing engine",
            "endpoints": {
                "home": "/ (public)",
                "meta": "/api/meta[/:model] (registry introspection)",
                "data": "/api/data/:model[/:id] (record operations)",
                "find": "/api/find/:model (planned queries)",
                "ops": "/api/ops/:operation (custom operations)",
                "auth": "/api/auth/whoami (session introspection)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
