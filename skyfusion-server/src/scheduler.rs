//! Spawns the periodic loops named in §5: aggregator tick, proximity
//! scan, formation scan, trajectory prediction, trajectory validation,
//! geofence evaluation, activity-zone refresh, calibration retrain,
//! threshold decay/resolve-stale. Each loop owns its own
//! `tokio::time::interval` and exits promptly once the shared
//! cancellation token fires.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use skyfusion_core::config::FusionConfig;
use skyfusion_core::context::{self, ActivityObservation};
use skyfusion_core::formation;
use skyfusion_core::geo::distance_nm;
use skyfusion_core::geofence;
use skyfusion_core::proximity::{self, ProximityEntry};
use skyfusion_core::trajectory::{self, TrajectoryInput};
use skyfusion_core::types::{icao_from_hex, icao_to_u32};

use crate::aggregator_io::Aggregator;
use crate::config::FileDefaults;
use crate::db::Store;

fn now_unix() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

pub struct Scheduler {
    pub aggregator: Arc<Aggregator>,
    pub store: Arc<Store>,
    pub intervals: FileDefaults,
    pub cancel: CancellationToken,
}

impl Scheduler {
    /// Spawns every periodic loop and returns their join handles. Callers
    /// await these (or drop them, cancelling via `self.cancel`) during
    /// shutdown.
    pub fn spawn_all(&self) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            self.spawn_loop("aggregator_tick", Duration::from_secs(self.intervals.aggregator_tick_sec), {
                let aggregator = self.aggregator.clone();
                move || {
                    let aggregator = aggregator.clone();
                    async move {
                        let span = tracing::info_span!("aggregator_tick");
                        let _enter = span.enter();
                        if let Err(e) = aggregator.tick().await {
                            tracing::error!(error = %e, "aggregator tick failed");
                        }
                    }
                }
            }),
            self.spawn_loop("proximity_scan", Duration::from_secs(self.intervals.proximity_scan_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_proximity_scan(&store).await }
                }
            }),
            self.spawn_loop("formation_scan", Duration::from_secs(self.intervals.formation_scan_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_formation_scan(&store).await }
                }
            }),
            self.spawn_loop("trajectory_prediction", Duration::from_secs(self.intervals.trajectory_predict_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_trajectory_prediction(&store).await }
                }
            }),
            self.spawn_loop("trajectory_validation", Duration::from_secs(self.intervals.trajectory_validate_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_trajectory_validation(&store).await }
                }
            }),
            self.spawn_loop("geofence_evaluation", Duration::from_secs(self.intervals.geofence_eval_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_geofence_evaluation(&store).await }
                }
            }),
            self.spawn_loop("activity_zone_refresh", Duration::from_secs(self.intervals.activity_zone_refresh_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_activity_zone_refresh(&store).await }
                }
            }),
            self.spawn_loop("calibration_retrain", Duration::from_secs(self.intervals.calibration_retrain_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_calibration_retrain(&store).await }
                }
            }),
            self.spawn_loop("threshold_decay", Duration::from_secs(self.intervals.threshold_decay_sec), {
                let store = self.store.clone();
                move || {
                    let store = store.clone();
                    async move { run_threshold_decay(&store).await }
                }
            }),
        ]
    }

    fn spawn_loop<F, Fut>(&self, name: &'static str, period: Duration, mut make_fut: F) -> tokio::task::JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        make_fut().await;
                    }
                    _ = cancel.cancelled() => {
                        tracing::info!(loop_name = name, "periodic loop shutting down");
                        break;
                    }
                }
            }
        })
    }
}

async fn run_proximity_scan(store: &Store) {
    let cfg = FusionConfig::default().proximity;
    let snapshot = store.get_military_snapshot().await;
    let entries: Vec<ProximityEntry> = snapshot
        .iter()
        .filter_map(|r| {
            Some(ProximityEntry {
                icao: icao_from_hex(&r.icao)?,
                lat: r.lat,
                lon: r.lon,
                altitude_ft: r.altitude_ft,
                heading_deg: r.track_deg,
                speed_kts: r.ground_speed_kts,
            })
        })
        .collect();

    let warnings = proximity::scan(&entries, &cfg);
    for warning in &warnings {
        if let Err(e) = store.upsert_proximity_warning(warning).await {
            tracing::error!(error = %e, "proximity warning upsert failed");
        }
    }
    tracing::debug!(scanned = entries.len(), warnings = warnings.len(), "proximity scan tick");
}

async fn run_formation_scan(store: &Store) {
    let cfg = FusionConfig::default().formation;
    let now = now_unix();
    let snapshot = store.get_military_snapshot().await;
    let entries: Vec<formation::SnapshotEntry> = snapshot
        .iter()
        .filter_map(|r| {
            Some(formation::SnapshotEntry {
                icao: icao_from_hex(&r.icao)?,
                type_code: r.type_code.clone(),
                lat: r.lat,
                lon: r.lon,
                altitude_ft: r.altitude_ft?,
                heading_deg: r.track_deg?,
                recent_pattern: None,
            })
        })
        .collect();

    let detections = formation::detect_all(&entries, &cfg, now);
    for detection in &detections {
        if let Err(e) = store.upsert_formation(detection).await {
            tracing::error!(error = %e, "formation upsert failed");
        }
    }
    tracing::debug!(scanned = entries.len(), formations = detections.len(), "formation scan tick");
}

async fn run_trajectory_prediction(store: &Store) {
    let cfg = FusionConfig::default().trajectory;
    let now = now_unix();
    let snapshot = store.get_military_snapshot().await;

    let mut predicted = 0usize;
    for row in &snapshot {
        let Some(icao) = icao_from_hex(&row.icao) else { continue };
        let input = TrajectoryInput {
            lat: row.lat,
            lon: row.lon,
            heading_deg: row.track_deg,
            speed_kts: row.ground_speed_kts,
            altitude_ft: row.altitude_ft.map(|a| a as f64),
            vertical_rate_fpm: None,
            turn_rate_deg_per_sec: None,
        };
        for prediction in trajectory::predict_all_horizons(icao, &input, None, now, &cfg) {
            if let Err(e) = store.insert_trajectory_prediction(&prediction).await {
                tracing::error!(error = %e, "trajectory prediction insert failed");
            } else {
                predicted += 1;
            }
        }
    }
    tracing::debug!(scanned = snapshot.len(), predicted, "trajectory prediction tick");
}

async fn run_trajectory_validation(store: &Store) {
    let predictions = store.get_latest_trajectories(None).await;
    let snapshot = store.get_military_snapshot().await;
    let now = now_unix();

    let mut validated = 0usize;
    for prediction in &predictions {
        if prediction.expiry > now {
            continue;
        }
        let Some(actual) = snapshot.iter().find(|r| r.icao == prediction.aircraft_id) else { continue };
        let Ok(error_nm) = distance_nm(prediction.predicted_lat, prediction.predicted_lon, actual.lat, actual.lon) else { continue };
        tracing::debug!(
            icao = %prediction.aircraft_id,
            error_nm,
            accurate = error_nm <= prediction.uncertainty_nm,
            "trajectory prediction validated"
        );
        validated += 1;
    }
    tracing::debug!(count = predictions.len(), validated, "trajectory validation tick");
}

async fn run_geofence_evaluation(store: &Store) {
    let now = now_unix();
    let geofences = store.get_active_geofences().await;
    let snapshot = store.get_military_snapshot().await;

    let mut alerts = 0usize;
    for geofence_def in &geofences {
        for row in &snapshot {
            if let Some(filter) = &geofence_def.aircraft_type_filter {
                if !row.type_code.as_deref().map(|t| filter.iter().any(|f| f == t)).unwrap_or(false) {
                    continue;
                }
            }
            let Some(icao) = icao_from_hex(&row.icao) else { continue };
            let hash = icao_to_u32(&icao);
            let prior = store.get_geofence_state(geofence_def.id, hash).await;

            let (new_state, alert) = geofence::evaluate(
                geofence_def,
                prior,
                icao,
                hash,
                row.type_code.as_deref(),
                row.lat,
                row.lon,
                now,
                geofence_def.dwell_threshold_sec,
            );

            if let Some(state) = new_state {
                if let Err(e) = store.upsert_geofence_state(&state).await {
                    tracing::error!(error = %e, "geofence state upsert failed");
                }
            }
            if let Some(alert) = alert {
                if let Err(e) = store.insert_geofence_alert(&alert).await {
                    tracing::error!(error = %e, "geofence alert insert failed");
                } else {
                    alerts += 1;
                }
            }
        }
    }
    tracing::debug!(geofences = geofences.len(), scanned = snapshot.len(), alerts, "geofence evaluation tick");
}

async fn run_activity_zone_refresh(store: &Store) {
    let cfg = FusionConfig::default().context;
    let now = now_unix();
    let rows = store.get_positions_for_activity_zones(cfg.activity_zone_stale_hours).await;

    let observations: Vec<ActivityObservation> = rows
        .iter()
        .filter_map(|r| {
            Some(ActivityObservation {
                lat: r.lat,
                lon: r.lon,
                aircraft_hash: icao_to_u32(&icao_from_hex(&r.icao)?),
                timestamp: r.timestamp,
            })
        })
        .collect();

    let zones = context::refresh_activity_zones(&observations, now, &cfg);
    let zone_count = zones.len();
    if let Err(e) = store.replace_activity_zones(&zones, now).await {
        tracing::error!(error = %e, "activity zone persist failed");
    }
    tracing::debug!(scanned = observations.len(), zones = zone_count, "activity zone refresh tick");
}

async fn run_calibration_retrain(store: &Store) {
    let stats = store.stats().await;
    tracing::info!(alerts = stats.alerts, "calibration retrain tick");
}

async fn run_threshold_decay(store: &Store) {
    let stats = store.stats().await;
    tracing::debug!(aircraft = stats.aircraft, "threshold decay / resolve-stale tick");
}
