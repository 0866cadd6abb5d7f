//! HTTP server.
//!
//! Serves paginated views of the current snapshot as JSON and exposes the
//! on-demand refresh. Page views only ever read the store; they never wait
//! on a refresh and never see a refresh failure.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/?page=N` | One page of the current snapshot |
//! | `POST` | `/refresh` | Run the pipeline now; returns page 1 of the result |
//! | `GET`  | `/health` | Status, version, and store state |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "fetch_failed", "message": "source https://… returned HTTP 503" } }
//! ```
//!
//! Error codes: `fetch_failed` (502), `empty_source` (502), `timeout` (504).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::models::{Item, Snapshot};
use crate::paginate::paginate;
use crate::pipeline::{RefreshError, Refresher};
use crate::scheduler::spawn_scheduler;
use crate::snapshot::{SnapshotStore, StoreState};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    refresher: Arc<Refresher>,
    page_size: usize,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>, page_size: usize) -> Self {
        Self {
            refresher,
            page_size,
        }
    }

    fn store(&self) -> &SnapshotStore {
        self.refresher.store()
    }
}

/// Builds the router. Separate from [`run_server`] so tests can mount it on
/// their own listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_page))
        .route("/refresh", post(handle_refresh))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the scheduler and the HTTP server using the default HTTP fetcher.
///
/// Runs until Ctrl-C, then stops the scheduler.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(&config.source)?);
    run_server_with_fetcher(config, fetcher).await
}

/// Like [`run_server`], with a caller-supplied [`Fetcher`].
pub async fn run_server_with_fetcher(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
) -> anyhow::Result<()> {
    let store = Arc::new(SnapshotStore::new());
    let refresher = Arc::new(Refresher::from_config(fetcher, store, config));

    let scheduler = spawn_scheduler(Arc::clone(&refresher), config.refresh_interval());
    let app = router(AppState::new(refresher, config.pages.page_size));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("rankfeed listening on http://{}", listener.local_addr()?);
    info!(bind = %config.server.bind, "server started");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    scheduler.abort();
    served?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"fetch_failed"`, `"timeout"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RefreshError> for AppError {
    fn from(err: RefreshError) -> Self {
        let status = match err {
            RefreshError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RefreshError::Fetch(_) | RefreshError::EmptySource => StatusCode::BAD_GATEWAY,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET / ============

/// Query string for `GET /`. `page` is kept as text so a malformed value
/// falls back to page 1 instead of rejecting the request.
#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn page_number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// One page of a snapshot, as returned by `GET /` and `POST /refresh`.
#[derive(Serialize)]
pub struct PageView {
    pub items: Vec<Item>,
    pub page: usize,
    pub total_pages: usize,
    /// Zero-based rank of the first item on the page.
    pub offset: usize,
    pub total_items: usize,
    /// Increases by one per installed snapshot; 0 before the first refresh.
    pub generation: u64,
    pub generated_at: String,
}

impl PageView {
    pub fn build(snapshot: &Snapshot, page_number: i64, page_size: usize) -> Self {
        let page = paginate(snapshot, page_number, page_size);
        Self {
            items: page.items.to_vec(),
            page: page.page,
            total_pages: page.total_pages,
            offset: page.offset(page_size),
            total_items: snapshot.len(),
            generation: snapshot.generation(),
            generated_at: snapshot.generated_at_display(),
        }
    }
}

async fn handle_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Json<PageView> {
    let snapshot = state.store().read();
    Json(PageView::build(&snapshot, query.page_number(), state.page_size))
}

// ============ POST /refresh ============

#[derive(Serialize)]
struct RefreshResponse {
    /// `"installed"` if this request fetched, `"coalesced"` if it joined a
    /// run already in flight.
    refreshed: &'static str,
    #[serde(flatten)]
    view: PageView,
}

async fn handle_refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let outcome = state.refresher.refresh().await.map_err(|e| {
        warn!(code = e.code(), error = %e, "on-demand refresh failed");
        AppError::from(e)
    })?;

    Ok(Json(RefreshResponse {
        refreshed: outcome.kind(),
        view: PageView::build(outcome.snapshot(), 1, state.page_size),
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    /// `"empty"` until the first successful refresh.
    state: String,
    items: usize,
    generated_at: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store().read();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        state: StoreState::of(&snapshot).as_str().to_string(),
        items: snapshot.len(),
        generated_at: snapshot.generated_at_display(),
    })
}
