//! Axum HTTP surface (§F): read-shaped REST API over the fusion store.
//!
//! This is a read API only — aircraft/position/intelligence state is
//! written by the scheduler's periodic loops, never by an HTTP handler.

pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::Store;

pub struct AppState {
    pub store: Arc<Store>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/aircraft", get(routes::api_aircraft))
        .route("/api/positions", get(routes::api_positions))
        .route("/api/formations", get(routes::api_formations))
        .route("/api/proximity-warnings", get(routes::api_proximity_warnings))
        .route("/api/trajectories", get(routes::api_trajectories))
        .route("/api/geofences", get(routes::api_geofences))
        .route("/api/alerts", get(routes::api_alerts))
        .route("/api/threat-assessments", get(routes::api_threat_assessments))
        .route("/api/stats", get(routes::api_stats))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Starts the web server. `store` is shared with the scheduler so reads
/// always see the latest committed ticks.
pub async fn serve(store: Arc<Store>, host: &str, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState { store });
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    tracing::info!(%addr, "web API listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
