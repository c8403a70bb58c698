//! # Lexflow HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! The server keeps no case state: callers send the snapshot they want to
//! operate on and store what comes back.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /stages` - Stages and permitted transitions
//! - `POST /calendar/add` - Advance a date by business or calendar days
//! - `POST /calendar/count` - Business days between two dates
//! - `POST /cases/open` - File a new case
//! - `POST /cases/transition` - Move a case to another stage
//! - `POST /cases/recompute` - Recompute deadline statuses
//! - `POST /deadlines/complete` - Complete a deadline
//! - `POST /deadlines/extend` - Extend a deadline
//! - `POST /deadlines/progress` - Set deadline progress
//! - `POST /deadlines/notify` - Record a sent notification
//! - `POST /deadlines/notes` - Replace deadline notes
//! - `POST /portfolio/summary` - Portfolio-wide deadline counts
//!
//! ## Configuration (Environment Variables)
//!
//! - `LEXFLOW_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `lexflow::api::*`)
pub use handlers::error_status;
pub use types::{
    CalendarAddRequest, CalendarCountRequest, CalendarResponse, CaseResponse, CompleteRequest,
    ExtendRequest, HealthResponse, NotesRequest, NotifyRequest, OpenCaseRequest,
    PortfolioRequest, PortfolioResponse, ProgressRequest, RecomputeRequest, StageJson,
    StagesResponse, TransitionRequest,
};

use crate::config::Runtime;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use lexflow_core::{CaseWorkflow, HolidaySet, LexflowError};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: immutable configuration only.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<CaseWorkflow>,
    pub holidays: Arc<HolidaySet>,
}

impl AppState {
    #[must_use]
    pub fn new(runtime: Runtime) -> Self {
        Self {
            workflow: Arc::new(runtime.workflow),
            holidays: Arc::new(runtime.holidays),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `LEXFLOW_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("LEXFLOW_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (LEXFLOW_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in LEXFLOW_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No LEXFLOW_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/stages", get(handlers::stages_handler))
        .route("/calendar/add", post(handlers::calendar_add_handler))
        .route("/calendar/count", post(handlers::calendar_count_handler))
        .route("/cases/open", post(handlers::open_case_handler))
        .route("/cases/transition", post(handlers::transition_handler))
        .route("/cases/recompute", post(handlers::recompute_handler))
        .route("/deadlines/complete", post(handlers::complete_handler))
        .route("/deadlines/extend", post(handlers::extend_handler))
        .route("/deadlines/progress", post(handlers::progress_handler))
        .route("/deadlines/notify", post(handlers::notify_handler))
        .route("/deadlines/notes", post(handlers::notes_handler))
        .route("/portfolio/summary", post(handlers::portfolio_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, runtime: Runtime) -> Result<(), LexflowError> {
    let router = create_router(AppState::new(runtime));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LexflowError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Lexflow HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LexflowError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
