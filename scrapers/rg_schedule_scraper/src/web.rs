use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::metrics::MetricsCollector;

#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricsCollector,
}

#[axum::debug_handler]
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_status())
}

/// Browsers never send a trailing slash in `Origin`, so configured entries are
/// compared without one.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::HEAD, Method::OPTIONS]);

    // `AllowOrigin::list` rejects a wildcard entry
    if allowed_origins.iter().any(|origin| origin.trim() == "*") {
        warn!("CORS origin list contains \"*\", allowing every origin");
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            let origin = origin.trim().trim_end_matches('/');
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = router(state, config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}
