//! In-process test harness: builds the full router with the in-memory store
//! and counting stub handlers, and drives it with tower::ServiceExt.

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use warden_api::app::{app, AppState};
use warden_api::auth::{generate_jwt, Claims, Session};
use warden_api::ops::{HandlerFailure, HandlerRegistry, OperationDispatcher, OperationHandler};
use warden_api::schema::{SchemaDocument, SchemaRegistry};
use warden_api::store::{MemoryStore, RecordStore};

pub const TEST_SCHEMA: &str = r#"
models:
  - name: Post
    fields:
      - { name: author_id, type: string, required: true }
      - { name: title, type: string, required: true }
      - { name: body, type: string }
      - { name: published, type: boolean, default: false }
      - { name: published_at, type: timestamp }
      - { name: tags, type: string, array: true }
    rules:
      - { actor: owner, operations: [create, read, update, delete] }
      - actor: authenticated
        operations: [read]
        condition: { field: published, value: true }
      - { actor: { group: editors }, operations: [update] }
      - actor: public_key
        operations: [read]
        condition: { field: published, value: true }
    indexes:
      - { name: byAuthor, partition_key: author_id, sort_key: title }
      - { name: byPublished, partition_key: published, sort_key: published_at }

custom_types:
  - name: ImportSummary
    fields:
      - { name: total, type: integer, required: true }
      - { name: query, type: string, required: true }

operations:
  - name: searchPosts
    kind: query
    args:
      - { name: term, type: string, required: true }
      - { name: limit, type: integer, default: 10 }
    returns: { model: Post, list: true }
    handler: search_posts
    rules:
      - { actor: authenticated, operations: [read] }
      - { actor: public_key, operations: [read] }

  - name: summarizeSearch
    kind: query
    args:
      - { name: term, type: string, required: true }
    returns: { custom: ImportSummary }
    handler: summarize_search
    rules:
      - { actor: authenticated, operations: [read] }

  - name: importPosts
    kind: mutation
    args:
      - { name: source_url, type: string, required: true }
    returns: { custom: ImportSummary }
    handler: import_posts
    rules:
      - { actor: { group: editors }, operations: [update] }

  - name: purgeDrafts
    kind: mutation
    args: []
    returns: { custom: ImportSummary }
    handler: purge_drafts
    rules: []
"#;

/// Echoes the validated arguments back inside a model-shaped list so tests
/// can observe defaults, and counts invocations.
struct SearchHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl OperationHandler for SearchHandler {
    async fn execute(
        &self,
        args: Map<String, Value>,
        _session: Option<&Session>,
    ) -> Result<Value, HandlerFailure> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(json!([{
            "id": uuid::Uuid::new_v4().to_string(),
            "title": "search hit",
            "term": args.get("term"),
            "limit": args.get("limit"),
        }]))
    }
}

struct ImportHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl OperationHandler for ImportHandler {
    async fn execute(
        &self,
        args: Map<String, Value>,
        _session: Option<&Session>,
    ) -> Result<Value, HandlerFailure> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(json!({
            "total": 3,
            "query": args.get("source_url"),
        }))
    }
}

pub struct TestApp {
    pub router: Router,
    pub search_calls: Arc<AtomicUsize>,
    pub import_calls: Arc<AtomicUsize>,
}

pub fn build_app() -> TestApp {
    let document = SchemaDocument::from_yaml(TEST_SCHEMA).expect("test schema parses");
    let registry = Arc::new(SchemaRegistry::register(document).expect("test schema registers"));

    let search_calls = Arc::new(AtomicUsize::new(0));
    let import_calls = Arc::new(AtomicUsize::new(0));
    let mut handlers = HandlerRegistry::new();
    handlers.register(
        "search_posts",
        Arc::new(SearchHandler {
            calls: search_calls.clone(),
        }),
    );
    handlers.register(
        "import_posts",
        Arc::new(ImportHandler {
            calls: import_calls.clone(),
        }),
    );
    // summarize_search is deliberately left unregistered

    let dispatcher = Arc::new(OperationDispatcher::new(
        registry.clone(),
        handlers,
        Duration::from_secs(5),
    ));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    TestApp {
        router: app(AppState {
            registry,
            store,
            dispatcher,
        }),
        search_calls,
        import_calls,
    }
}

pub fn token_for(subject: &str, groups: &[&str]) -> String {
    let claims = Claims::new(
        subject.to_string(),
        Some(format!("{}@example.com", subject)),
        groups.iter().map(|g| g.to_string()).collect(),
    );
    generate_jwt(&claims).expect("test token issued")
}

pub struct TestRequest {
    method: &'static str,
    uri: String,
    bearer: Option<String>,
    api_key: Option<&'static str>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new("POST", uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new("PATCH", uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new("DELETE", uri)
    }

    fn new(method: &'static str, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            bearer: None,
            api_key: None,
            body: None,
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn api_key(mut self) -> Self {
        // Matches the dev-preset digest
        self.api_key = Some("dev-api-key");
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub async fn send(self, app: &TestApp) -> Result<TestResponse> {
        let mut builder = Request::builder().method(self.method).uri(self.uri.as_str());
        if let Some(token) = &self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(key) = self.api_key {
            builder = builder.header("x-api-key", key);
        }
        let request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = app.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// Create a post through the API and return its id.
pub async fn create_post(app: &TestApp, token: &str, body: Value) -> Result<String> {
    let res = TestRequest::post("/api/data/Post")
        .bearer(token)
        .json(body)
        .send(app)
        .await?;
    anyhow::ensure!(
        res.status == StatusCode::CREATED,
        "create failed: {} {}",
        res.status,
        res.body
    );
    Ok(res.data()["id"].as_str().expect("created id").to_string())
}
