//! REST API route handlers (§F). Every handler reads from [`Store`] —
//! there is no live in-process tracker state to special-case, since all
//! aircraft/position/intelligence state is written by the scheduler's
//! periodic loops rather than by a request handler.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::web::AppState;

fn clamp(val: f64, min: f64, max: f64) -> f64 {
    val.max(min).min(max)
}

fn clamp_i64(val: i64, min: i64, max: i64) -> i64 {
    val.max(min).min(max)
}

#[derive(Deserialize)]
pub struct AircraftParams {
    military: Option<bool>,
}

#[derive(Deserialize)]
pub struct PositionParams {
    minutes: Option<f64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct TrajectoryParams {
    icao: Option<String>,
}

#[derive(Deserialize)]
pub struct AlertParams {
    limit: Option<i64>,
}

/// GET /api/aircraft — optionally filtered to military-classified only.
pub async fn api_aircraft(State(state): State<Arc<AppState>>, Query(params): Query<AircraftParams>) -> impl IntoResponse {
    let aircraft = state.store.get_all_aircraft(params.military.unwrap_or(false)).await;
    Json(serde_json::to_value(&aircraft).unwrap_or(json!([])))
}

/// GET /api/positions — recent positions for map polling.
pub async fn api_positions(State(state): State<Arc<AppState>>, Query(params): Query<PositionParams>) -> impl IntoResponse {
    let minutes = clamp(params.minutes.unwrap_or(5.0), 1.0, 525_600.0);
    let limit = clamp_i64(params.limit.unwrap_or(50_000), 1, 100_000);
    let positions = state.store.get_recent_positions(minutes, limit).await;
    Json(serde_json::to_value(&positions).unwrap_or(json!([])))
}

/// GET /api/formations — active formation detections.
pub async fn api_formations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let formations = state.store.get_active_formations().await;
    Json(serde_json::to_value(&formations).unwrap_or(json!([])))
}

/// GET /api/proximity-warnings — active CPA warnings.
pub async fn api_proximity_warnings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let warnings = state.store.get_active_proximity_warnings().await;
    Json(serde_json::to_value(&warnings).unwrap_or(json!([])))
}

/// GET /api/trajectories?icao= — latest predictions, optionally scoped
/// to one aircraft.
pub async fn api_trajectories(State(state): State<Arc<AppState>>, Query(params): Query<TrajectoryParams>) -> impl IntoResponse {
    let trajectories = state.store.get_latest_trajectories(params.icao.as_deref()).await;
    Json(serde_json::to_value(&trajectories).unwrap_or(json!([])))
}

/// GET /api/geofences — active geofence polygons.
pub async fn api_geofences(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let geofences = state.store.get_active_geofences().await;
    Json(serde_json::to_value(&geofences).unwrap_or(json!([])))
}

/// GET /api/alerts — most recent intelligence alerts.
pub async fn api_alerts(State(state): State<Arc<AppState>>, Query(params): Query<AlertParams>) -> impl IntoResponse {
    let limit = clamp_i64(params.limit.unwrap_or(200), 1, 5000);
    let alerts = state.store.get_recent_alerts(limit).await;
    Json(serde_json::to_value(&alerts).unwrap_or(json!([])))
}

/// GET /api/threat-assessments — assessments still inside their validity
/// window.
pub async fn api_threat_assessments(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let assessments = state.store.get_active_threat_assessments(now).await;
    Json(serde_json::to_value(&assessments).unwrap_or(json!([])))
}

/// GET /api/stats — store-wide counters.
pub async fn api_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.store.stats().await;
    Json(json!({
        "aircraft": stats.aircraft,
        "positions_24h": stats.positions_24h,
        "active_formations": stats.active_formations,
        "active_warnings": stats.active_warnings,
        "alerts": stats.alerts,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::Store;
    use crate::web::{build_router, AppState};
    use std::sync::Arc;

    /// Exercises routing against a real Postgres instance. No local
    /// Postgres runs in CI, so this is `#[ignore]`d; run locally with
    /// `SKYFUSION_TEST_DATABASE_URL` set.
    #[tokio::test]
    #[ignore]
    async fn test_api_aircraft_returns_ok() {
        let url = std::env::var("SKYFUSION_TEST_DATABASE_URL").expect("SKYFUSION_TEST_DATABASE_URL");
        let store = Arc::new(Store::connect(&url).await.unwrap());
        let app = build_router(Arc::new(AppState { store }));

        let response = app.oneshot(Request::builder().uri("/api/aircraft").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
