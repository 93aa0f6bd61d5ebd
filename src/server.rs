//! Scrape endpoint serving the registry in the Prometheus text format
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::{ExporterError, Result};
use crate::metrics::MetricRegistry;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Create the router exposing `GET /metrics`
pub fn create_router(registry: Arc<MetricRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

async fn metrics_handler(State(registry): State<Arc<MetricRegistry>>) -> Response {
    match registry.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve the scrape endpoint on all interfaces until the process exits
pub async fn serve(registry: Arc<MetricRegistry>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ExporterError::Startup(format!("cannot listen on {}: {}", addr, e)))?;

    info!("Serving metrics on http://{}/metrics", addr);
    axum::serve(listener, create_router(registry)).await?;
    Ok(())
}
