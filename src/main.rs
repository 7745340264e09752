use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use warden_api::app::{app, AppState};
use warden_api::config;
use warden_api::ops::{HandlerRegistry, OperationDispatcher};
use warden_api::schema::{SchemaDocument, SchemaRegistry};
use warden_api::store::{MemoryStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, WARDEN_SCHEMA_PATH, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Warden API in {:?} mode", config.environment);

    // Schema errors are fatal: the registry must build before any request is served
    let document = SchemaDocument::load(&config.schema.path)
        .with_context(|| format!("loading schema document from {}", config.schema.path))?;
    let registry = Arc::new(SchemaRegistry::register(document).context("registering schema")?);

    // Handler collaborators are registered here by the embedding deployment;
    // operations without one fail at invoke time, not at startup
    let handlers = HandlerRegistry::new();
    for operation in registry.operations() {
        if handlers.get(&operation.handler).is_none() {
            tracing::warn!(
                operation = %operation.name,
                handler = %operation.handler,
                "no handler registered for operation"
            );
        }
    }

    let dispatcher = Arc::new(OperationDispatcher::new(
        registry.clone(),
        handlers,
        Duration::from_millis(config.ops.handler_timeout_ms),
    ));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    let app = app(AppState {
        registry,
        store,
        dispatcher,
    });

    // Allow tests or deployments to override port via env
    let port = std::env::var("WARDEN_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("Warden API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
