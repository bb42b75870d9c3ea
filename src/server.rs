//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/?q=<query>` | Search page (HTML) |
//! | `GET`  | `/sync` | Request a background sync; always answers `Populating...` |
//! | `GET`  | `/status` | Sync coordinator state (JSON) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Anything else is a plain-text 404.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::index::{RecordIndex, SqliteIndex};
use crate::ingest::build_pipeline;
use crate::query::QueryService;
use crate::sync::{SyncCoordinator, SyncStatus};
use crate::view;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub query: QueryService,
    pub sync: SyncCoordinator,
}

/// Builds the router. Separate from [`run_server`] so tests can serve it on
/// an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_search))
        .route("/sync", get(handle_sync))
        .route("/status", get(handle_status))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wires the production pipeline, coordinator and query service.
///
/// Ensures the index schema exists and, with `[sync].on_startup`, requests a
/// sync straight away.
pub async fn build_state(config: &Config) -> anyhow::Result<(AppState, SqliteIndex)> {
    let (pipeline, index) = build_pipeline(config).await?;

    let coordinator = SyncCoordinator::new(
        Arc::new(pipeline),
        Arc::new(SystemClock),
        config.sync.staleness(),
    );
    if config.sync.on_startup {
        coordinator.request_sync();
    }

    let state = AppState {
        query: QueryService::new(Arc::new(index.clone())),
        sync: coordinator,
    };
    Ok((state, index))
}

/// Starts the server on `[server].host:port` and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let (state, index) = build_state(config).await?;
    let indexed = index.count().await?;

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, records = indexed, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    index.pool().close().await;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// Handler for `GET /`.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let q = params.q.as_deref().filter(|q| !q.is_empty());
    let results = state.query.search(q).await;
    Html(view::render_home(q, &results))
}

/// Handler for `GET /sync`. Fire-and-forget.
async fn handle_sync(State(state): State<AppState>) -> &'static str {
    state.sync.request_sync();
    "Populating..."
}

async fn handle_status(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.sync.status())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
