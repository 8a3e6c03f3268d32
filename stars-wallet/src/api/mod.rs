//! HTTP messaging surface
//!
//! A chat transport posts inbound events to `/events` and renders the
//! returned effects; the remaining routes expose the ledger read-side.

mod handlers;
mod responses;
mod routes;

pub use responses::*;
pub use routes::*;

use crate::config::ApiConfig;
use crate::infrastructure::ServiceContainer;
use crate::services::WalletService;
use anyhow::Result;
use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub services: Arc<ServiceContainer>,
    pub wallet: Arc<WalletService>,
}

impl ApiState {
    pub fn new(services: Arc<ServiceContainer>) -> Self {
        let wallet = services.wallet.clone();
        Self { services, wallet }
    }
}

/// Build the router with all routes and request tracing
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .merge(create_event_routes())
        .merge(create_account_routes())
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the API server
pub async fn start_server(
    services: Arc<ServiceContainer>,
    config: &ApiConfig,
) -> Result<tokio::task::JoinHandle<()>> {
    let mut app = create_router(ApiState::new(services))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));
    if config.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("API server listening on {}", config.bind_address);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(handle)
}

/// Health check handler
async fn health_handler(
    axum::extract::State(state): axum::extract::State<ApiState>,
) -> (StatusCode, Json<Value>) {
    let health = state.services.health().await;
    let status = if health.overall {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if health.overall { "healthy" } else { "degraded" },
            "timestamp": chrono::Utc::now().timestamp(),
            "service": "stars-wallet",
            "account_store": health.account_store,
            "session_store": health.session_store,
        })),
    )
}

/// Prometheus metrics handler
async fn metrics_handler(
    axum::extract::State(state): axum::extract::State<ApiState>,
) -> Result<String, StatusCode> {
    if !state.services.config.monitoring.metrics_enabled {
        return Err(StatusCode::NOT_FOUND);
    }
    state.services.metrics.render().map_err(|e| {
        tracing::error!("Failed to render metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
