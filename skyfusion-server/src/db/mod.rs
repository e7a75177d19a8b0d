//! Postgres/PostGIS/pgvector store (§6). Schema is applied at connect
//! time, idempotent, and tolerant of missing optional extensions so a
//! fresh database without PostGIS/pgvector installed still boots.

pub mod models;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use skyfusion_core::context::ActivityZone;
use skyfusion_core::types::{
    icao_from_hex, icao_to_string, Aircraft, FormationDetection, GeofenceAircraftState,
    GeofenceAlert, GeofencePolygon, GeofenceState, Icao, IntelligenceAlert, Position,
    ProximityWarning, ThreatAssessment, TrajectoryPrediction,
};

use models::*;

const SCHEMA: &str = r#"
CREATE EXTENSION IF NOT EXISTS postgis;
CREATE EXTENSION IF NOT EXISTS vector;

CREATE TABLE IF NOT EXISTS aircraft (
    icao TEXT PRIMARY KEY,
    type_code TEXT,
    operator TEXT,
    is_military BOOLEAN NOT NULL DEFAULT FALSE,
    military_category TEXT,
    country TEXT,
    first_seen DOUBLE PRECISION NOT NULL,
    last_seen DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS positions (
    icao TEXT NOT NULL,
    lat DOUBLE PRECISION NOT NULL,
    lon DOUBLE PRECISION NOT NULL,
    altitude_ft INTEGER,
    ground_speed_kts DOUBLE PRECISION,
    track_deg DOUBLE PRECISION,
    vertical_rate_fpm INTEGER,
    source TEXT NOT NULL,
    timestamp DOUBLE PRECISION NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_positions_icao_time ON positions(icao, timestamp DESC);

CREATE TABLE IF NOT EXISTS positions_latest (
    icao TEXT PRIMARY KEY,
    lat DOUBLE PRECISION NOT NULL,
    lon DOUBLE PRECISION NOT NULL,
    altitude_ft INTEGER,
    ground_speed_kts DOUBLE PRECISION,
    track_deg DOUBLE PRECISION,
    vertical_rate_fpm INTEGER,
    source TEXT NOT NULL,
    timestamp DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS behavioral_profiles (
    aircraft_id TEXT PRIMARY KEY,
    type_code TEXT,
    data JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS formation_detections (
    id BIGSERIAL PRIMARY KEY,
    formation_type TEXT NOT NULL,
    lead TEXT NOT NULL,
    members TEXT[] NOT NULL,
    center_lat DOUBLE PRECISION NOT NULL,
    center_lon DOUBLE PRECISION NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    first_detected DOUBLE PRECISION NOT NULL,
    last_seen DOUBLE PRECISION NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE IF NOT EXISTS proximity_warnings (
    aircraft_id_1 TEXT NOT NULL,
    aircraft_id_2 TEXT NOT NULL,
    warning_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    cpa_distance_nm DOUBLE PRECISION NOT NULL,
    cpa_time_min DOUBLE PRECISION NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    acknowledged BOOLEAN NOT NULL DEFAULT FALSE,
    last_updated DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (aircraft_id_1, aircraft_id_2)
);

CREATE TABLE IF NOT EXISTS trajectory_predictions (
    aircraft_id TEXT NOT NULL,
    horizon TEXT NOT NULL,
    predicted_at DOUBLE PRECISION NOT NULL,
    predicted_lat DOUBLE PRECISION NOT NULL,
    predicted_lon DOUBLE PRECISION NOT NULL,
    uncertainty_nm DOUBLE PRECISION NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    expiry DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (aircraft_id, horizon, predicted_at)
);

CREATE TABLE IF NOT EXISTS geofences (
    id BIGSERIAL PRIMARY KEY,
    owner_id TEXT NOT NULL,
    vertices JSONB NOT NULL,
    alert_on_entry BOOLEAN NOT NULL DEFAULT TRUE,
    alert_on_exit BOOLEAN NOT NULL DEFAULT TRUE,
    alert_on_dwell BOOLEAN NOT NULL DEFAULT TRUE,
    dwell_threshold_sec DOUBLE PRECISION NOT NULL DEFAULT 300,
    aircraft_type_filter TEXT[],
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE IF NOT EXISTS geofence_aircraft_state (
    geofence_id BIGINT NOT NULL,
    aircraft_id_hash BIGINT NOT NULL,
    state TEXT NOT NULL,
    entry_lat DOUBLE PRECISION NOT NULL,
    entry_lon DOUBLE PRECISION NOT NULL,
    entry_time DOUBLE PRECISION NOT NULL,
    last_lat DOUBLE PRECISION NOT NULL,
    last_lon DOUBLE PRECISION NOT NULL,
    last_seen DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (geofence_id, aircraft_id_hash)
);

CREATE TABLE IF NOT EXISTS geofence_alerts (
    id BIGSERIAL PRIMARY KEY,
    geofence_id BIGINT NOT NULL,
    aircraft_id TEXT NOT NULL,
    transition TEXT NOT NULL,
    severity TEXT NOT NULL,
    timestamp DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS threat_assessments (
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    score DOUBLE PRECISION NOT NULL,
    level TEXT NOT NULL,
    computed_at DOUBLE PRECISION NOT NULL,
    valid_until DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (entity_type, entity_id)
);

CREATE TABLE IF NOT EXISTS alerts (
    id BIGSERIAL PRIMARY KEY,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    severity TEXT NOT NULL,
    aircraft TEXT[] NOT NULL,
    regions TEXT[] NOT NULL,
    news_refs TEXT[] NOT NULL,
    timestamp DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_zones (
    center_lat DOUBLE PRECISION NOT NULL,
    center_lon DOUBLE PRECISION NOT NULL,
    level TEXT NOT NULL,
    refreshed_at DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (center_lat, center_lon)
);

CREATE TABLE IF NOT EXISTS calibration_models (
    task TEXT PRIMARY KEY,
    a DOUBLE PRECISION NOT NULL,
    b DOUBLE PRECISION NOT NULL,
    sample_count INTEGER NOT NULL,
    ece DOUBLE PRECISION NOT NULL
);

CREATE TABLE IF NOT EXISTS adaptive_thresholds (
    task TEXT PRIMARY KEY,
    alpha DOUBLE PRECISION NOT NULL,
    beta DOUBLE PRECISION NOT NULL,
    current_value DOUBLE PRECISION NOT NULL,
    min_value DOUBLE PRECISION NOT NULL,
    max_value DOUBLE PRECISION NOT NULL
);
"#;

pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        Self::migrate_pool(&pool).await;
        Ok(Store { pool })
    }

    async fn migrate_pool(pool: &PgPool) {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if let Err(e) = sqlx::query(statement).execute(pool).await {
                tracing::warn!(statement, error = %e, "schema statement failed (optional extension may be missing)");
            }
        }
    }

    pub async fn migrate(&self) {
        Self::migrate_pool(&self.pool).await;
    }

    // -- aircraft / positions -------------------------------------------------

    pub async fn upsert_aircraft(&self, a: &Aircraft) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO aircraft (icao, type_code, operator, is_military, military_category, country, first_seen, last_seen)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (icao) DO UPDATE SET
                type_code = COALESCE(EXCLUDED.type_code, aircraft.type_code),
                operator = COALESCE(EXCLUDED.operator, aircraft.operator),
                is_military = aircraft.is_military OR EXCLUDED.is_military,
                military_category = COALESCE(EXCLUDED.military_category, aircraft.military_category),
                country = COALESCE(aircraft.country, EXCLUDED.country),
                last_seen = GREATEST(aircraft.last_seen, EXCLUDED.last_seen)",
        )
        .bind(icao_to_string(&a.icao))
        .bind(&a.type_code)
        .bind(&a.operator)
        .bind(a.is_military)
        .bind(a.military_category.map(|c| format!("{c:?}")))
        .bind(a.country)
        .bind(a.first_seen)
        .bind(a.last_seen)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_position(&self, p: &Position) -> Result<(), sqlx::Error> {
        let icao = icao_to_string(&p.icao);
        sqlx::query(
            "INSERT INTO positions (icao, lat, lon, altitude_ft, ground_speed_kts, track_deg, vertical_rate_fpm, source, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&icao)
        .bind(p.lat)
        .bind(p.lon)
        .bind(p.altitude_ft)
        .bind(p.ground_speed_kts)
        .bind(p.track_deg)
        .bind(p.vertical_rate_fpm)
        .bind(&p.source)
        .bind(p.timestamp)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO positions_latest (icao, lat, lon, altitude_ft, ground_speed_kts, track_deg, vertical_rate_fpm, source, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (icao) DO UPDATE SET
                lat = EXCLUDED.lat, lon = EXCLUDED.lon, altitude_ft = EXCLUDED.altitude_ft,
                ground_speed_kts = EXCLUDED.ground_speed_kts, track_deg = EXCLUDED.track_deg,
                vertical_rate_fpm = EXCLUDED.vertical_rate_fpm, source = EXCLUDED.source, timestamp = EXCLUDED.timestamp
             WHERE positions_latest.timestamp <= EXCLUDED.timestamp",
        )
        .bind(&icao)
        .bind(p.lat)
        .bind(p.lon)
        .bind(p.altitude_ft)
        .bind(p.ground_speed_kts)
        .bind(p.track_deg)
        .bind(p.vertical_rate_fpm)
        .bind(&p.source)
        .bind(p.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_all_aircraft(&self, military_only: bool) -> Vec<AircraftRow> {
        let sql = if military_only {
            "SELECT icao, type_code, operator, is_military, military_category, country, first_seen, last_seen FROM aircraft WHERE is_military ORDER BY last_seen DESC"
        } else {
            "SELECT icao, type_code, operator, is_military, military_category, country, first_seen, last_seen FROM aircraft ORDER BY last_seen DESC"
        };
        sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_default()
            .iter()
            .map(AircraftRow::from_row)
            .collect()
    }

    pub async fn get_recent_positions(&self, minutes: f64, limit: i64) -> Vec<PositionRow> {
        let since = chrono::Utc::now().timestamp() as f64 - minutes * 60.0;
        sqlx::query(
            "SELECT icao, lat, lon, altitude_ft, ground_speed_kts, track_deg, vertical_rate_fpm, timestamp
             FROM positions WHERE timestamp >= $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(PositionRow::from_row)
        .collect()
    }

    // -- formations / proximity / trajectories --------------------------------

    pub async fn upsert_formation(&self, f: &FormationDetection) -> Result<(), sqlx::Error> {
        let members: Vec<String> = f.members.iter().map(icao_to_string).collect();
        sqlx::query(
            "INSERT INTO formation_detections (formation_type, lead, members, center_lat, center_lon, confidence, first_detected, last_seen, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(format!("{:?}", f.formation_type))
        .bind(icao_to_string(&f.lead))
        .bind(members)
        .bind(f.center_lat)
        .bind(f.center_lon)
        .bind(f.confidence)
        .bind(f.first_detected)
        .bind(f.last_seen)
        .bind(f.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_active_formations(&self) -> Vec<FormationRow> {
        sqlx::query(
            "SELECT formation_type, lead, members, center_lat, center_lon, confidence, last_seen
             FROM formation_detections WHERE active ORDER BY last_seen DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(FormationRow::from_row)
        .collect()
    }

    pub async fn upsert_proximity_warning(&self, w: &ProximityWarning) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO proximity_warnings (aircraft_id_1, aircraft_id_2, warning_type, severity, cpa_distance_nm, cpa_time_min, confidence, active, acknowledged, last_updated)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (aircraft_id_1, aircraft_id_2) DO UPDATE SET
                warning_type = EXCLUDED.warning_type, severity = EXCLUDED.severity,
                cpa_distance_nm = EXCLUDED.cpa_distance_nm, cpa_time_min = EXCLUDED.cpa_time_min,
                confidence = EXCLUDED.confidence, active = EXCLUDED.active, last_updated = EXCLUDED.last_updated",
        )
        .bind(icao_to_string(&w.aircraft_id_1))
        .bind(icao_to_string(&w.aircraft_id_2))
        .bind(format!("{:?}", w.warning_type))
        .bind(format!("{:?}", w.severity))
        .bind(w.cpa_distance_nm)
        .bind(w.cpa_time_min)
        .bind(w.confidence)
        .bind(w.active)
        .bind(w.acknowledged)
        .bind(w.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_active_proximity_warnings(&self) -> Vec<ProximityWarningRow> {
        sqlx::query(
            "SELECT aircraft_id_1, aircraft_id_2, warning_type, severity, cpa_distance_nm, cpa_time_min, confidence, last_updated
             FROM proximity_warnings WHERE active ORDER BY last_updated DESC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(ProximityWarningRow::from_row)
        .collect()
    }

    pub async fn insert_trajectory_prediction(&self, t: &TrajectoryPrediction) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO trajectory_predictions (aircraft_id, horizon, predicted_at, predicted_lat, predicted_lon, uncertainty_nm, confidence, expiry)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (aircraft_id, horizon, predicted_at) DO NOTHING",
        )
        .bind(icao_to_string(&t.aircraft_id))
        .bind(format!("{:?}", t.horizon))
        .bind(t.predicted_at)
        .bind(t.predicted_lat)
        .bind(t.predicted_lon)
        .bind(t.uncertainty_nm)
        .bind(t.confidence)
        .bind(t.expiry)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_latest_trajectories(&self, icao: Option<&str>) -> Vec<TrajectoryRow> {
        let rows = if let Some(icao) = icao {
            sqlx::query(
                "SELECT DISTINCT ON (aircraft_id, horizon) aircraft_id, horizon, predicted_at, predicted_lat, predicted_lon, uncertainty_nm, confidence, expiry
                 FROM trajectory_predictions WHERE aircraft_id = $1 ORDER BY aircraft_id, horizon, predicted_at DESC",
            )
            .bind(icao)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(
                "SELECT DISTINCT ON (aircraft_id, horizon) aircraft_id, horizon, predicted_at, predicted_lat, predicted_lon, uncertainty_nm, confidence, expiry
                 FROM trajectory_predictions ORDER BY aircraft_id, horizon, predicted_at DESC",
            )
            .fetch_all(&self.pool)
            .await
        };
        rows.unwrap_or_default().iter().map(TrajectoryRow::from_row).collect()
    }

    // -- geofences --------------------------------------------------------------

    pub async fn get_active_geofences(&self) -> Vec<GeofencePolygon> {
        sqlx::query(
            "SELECT id, owner_id, vertices, alert_on_entry, alert_on_exit, alert_on_dwell, dwell_threshold_sec, aircraft_type_filter, is_active
             FROM geofences WHERE is_active",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(geofence_from_row)
        .collect()
    }

    pub async fn upsert_geofence_state(&self, s: &GeofenceAircraftState) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO geofence_aircraft_state (geofence_id, aircraft_id_hash, state, entry_lat, entry_lon, entry_time, last_lat, last_lon, last_seen)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (geofence_id, aircraft_id_hash) DO UPDATE SET
                state = EXCLUDED.state, entry_lat = EXCLUDED.entry_lat, entry_lon = EXCLUDED.entry_lon,
                entry_time = EXCLUDED.entry_time, last_lat = EXCLUDED.last_lat, last_lon = EXCLUDED.last_lon,
                last_seen = EXCLUDED.last_seen",
        )
        .bind(s.geofence_id)
        .bind(s.aircraft_id_hash as i64)
        .bind(format!("{:?}", s.state))
        .bind(s.entry_lat)
        .bind(s.entry_lon)
        .bind(s.entry_time)
        .bind(s.last_lat)
        .bind(s.last_lon)
        .bind(s.last_seen)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_geofence_state(&self, geofence_id: i64, aircraft_id_hash: u32) -> Option<GeofenceAircraftState> {
        let row = sqlx::query(
            "SELECT geofence_id, aircraft_id_hash, state, entry_lat, entry_lon, entry_time, last_lat, last_lon, last_seen
             FROM geofence_aircraft_state WHERE geofence_id = $1 AND aircraft_id_hash = $2",
        )
        .bind(geofence_id)
        .bind(aircraft_id_hash as i64)
        .fetch_optional(&self.pool)
        .await
        .ok()??;

        let state = match row.get::<String, _>("state").as_str() {
            "Inside" => GeofenceState::Inside,
            "Dwelling" => GeofenceState::Dwelling,
            _ => GeofenceState::Outside,
        };
        Some(GeofenceAircraftState {
            geofence_id: row.get("geofence_id"),
            aircraft_id_hash: row.get::<i64, _>("aircraft_id_hash") as u32,
            state,
            entry_lat: row.get("entry_lat"),
            entry_lon: row.get("entry_lon"),
            entry_time: row.get("entry_time"),
            last_lat: row.get("last_lat"),
            last_lon: row.get("last_lon"),
            last_seen: row.get("last_seen"),
        })
    }

    pub async fn insert_geofence_alert(&self, a: &GeofenceAlert) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO geofence_alerts (geofence_id, aircraft_id, transition, severity, timestamp)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(a.geofence_id)
        .bind(icao_to_string(&a.aircraft_id))
        .bind(format!("{:?}", a.transition))
        .bind(format!("{:?}", a.severity))
        .bind(a.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // -- threat / alerts ----------------------------------------------------

    pub async fn upsert_threat_assessment(&self, t: &ThreatAssessment) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO threat_assessments (entity_type, entity_id, score, level, computed_at, valid_until)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (entity_type, entity_id) DO UPDATE SET
                score = EXCLUDED.score, level = EXCLUDED.level, computed_at = EXCLUDED.computed_at, valid_until = EXCLUDED.valid_until",
        )
        .bind(&t.entity_type)
        .bind(&t.entity_id)
        .bind(t.score)
        .bind(format!("{:?}", t.level))
        .bind(t.computed_at)
        .bind(t.valid_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_active_threat_assessments(&self, now: f64) -> Vec<ThreatAssessmentRow> {
        sqlx::query(
            "SELECT entity_type, entity_id, score, level, computed_at, valid_until
             FROM threat_assessments WHERE valid_until >= $1 ORDER BY score DESC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(ThreatAssessmentRow::from_row)
        .collect()
    }

    pub async fn insert_alert(&self, a: &IntelligenceAlert) -> Result<(), sqlx::Error> {
        let aircraft: Vec<String> = a.aircraft.iter().map(icao_to_string).collect();
        sqlx::query(
            "INSERT INTO alerts (kind, title, description, severity, aircraft, regions, news_refs, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(format!("{:?}", a.kind))
        .bind(&a.title)
        .bind(&a.description)
        .bind(format!("{:?}", a.severity))
        .bind(aircraft)
        .bind(&a.regions)
        .bind(&a.news_refs)
        .bind(a.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_recent_alerts(&self, limit: i64) -> Vec<AlertRow> {
        sqlx::query(
            "SELECT kind, title, description, severity, aircraft, regions, timestamp
             FROM alerts ORDER BY timestamp DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(AlertRow::from_row)
        .collect()
    }

    /// Joins `aircraft` (military only) against `positions_latest` to
    /// build the snapshot the formation/proximity scans run against.
    pub async fn get_military_snapshot(&self) -> Vec<SnapshotRow> {
        sqlx::query(
            "SELECT a.icao, a.type_code, p.lat, p.lon, p.altitude_ft, p.track_deg, p.ground_speed_kts
             FROM aircraft a JOIN positions_latest p ON p.icao = a.icao
             WHERE a.is_military AND p.timestamp > extract(epoch from now()) - 300",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(SnapshotRow::from_row)
        .collect()
    }

    /// Military-aircraft position samples feeding `context::refresh_activity_zones`.
    pub async fn get_positions_for_activity_zones(&self, stale_hours: f64) -> Vec<ActivityPositionRow> {
        let since = chrono::Utc::now().timestamp() as f64 - stale_hours * 3600.0;
        sqlx::query(
            "SELECT p.icao, p.lat, p.lon, p.timestamp
             FROM positions p JOIN aircraft a ON a.icao = p.icao
             WHERE a.is_military AND p.timestamp >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
        .iter()
        .map(ActivityPositionRow::from_row)
        .collect()
    }

    /// Replaces the materialized activity-zone set with a freshly clustered one.
    pub async fn replace_activity_zones(&self, zones: &[ActivityZone], now: f64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM activity_zones").execute(&mut *tx).await?;
        for zone in zones {
            sqlx::query(
                "INSERT INTO activity_zones (center_lat, center_lon, level, refreshed_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(zone.center_lat)
            .bind(zone.center_lon)
            .bind(format!("{:?}", zone.level))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn stats(&self) -> DbStats {
        let aircraft: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aircraft").fetch_one(&self.pool).await.unwrap_or(0);
        let positions_24h: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM positions WHERE timestamp > extract(epoch from now()) - 86400")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let active_formations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM formation_detections WHERE active").fetch_one(&self.pool).await.unwrap_or(0);
        let active_warnings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proximity_warnings WHERE active").fetch_one(&self.pool).await.unwrap_or(0);
        let alerts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts").fetch_one(&self.pool).await.unwrap_or(0);

        DbStats { aircraft, positions_24h, active_formations, active_warnings, alerts }
    }
}

pub struct DbStats {
    pub aircraft: i64,
    pub positions_24h: i64,
    pub active_formations: i64,
    pub active_warnings: i64,
    pub alerts: i64,
}

fn geofence_from_row(row: &sqlx::postgres::PgRow) -> GeofencePolygon {
    let vertices_json: serde_json::Value = row.get("vertices");
    let vertices: Vec<(f64, f64)> = serde_json::from_value(vertices_json).unwrap_or_default();
    GeofencePolygon {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        vertices,
        alert_on_entry: row.get("alert_on_entry"),
        alert_on_exit: row.get("alert_on_exit"),
        alert_on_dwell: row.get("alert_on_dwell"),
        dwell_threshold_sec: row.get("dwell_threshold_sec"),
        aircraft_type_filter: row.get("aircraft_type_filter"),
        is_active: row.get("is_active"),
    }
}

pub fn parse_icao(s: &str) -> Option<Icao> {
    icao_from_hex(s)
}
