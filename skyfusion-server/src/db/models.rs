//! Plain read-model rows returned by [`super::Store`] query methods.
//!
//! These are deliberately NOT the `skyfusion_core::types` structs: the
//! core types carry fields (confidence internals, raw components) that
//! aren't meant to cross the wire to API clients, and some columns are
//! stored denormalized (e.g. enum variants as text) and need a cheap
//! parse back into a display-friendly shape.

use sqlx::Row;

use skyfusion_core::types::icao_from_hex;

#[derive(Debug, serde::Serialize)]
pub struct AircraftRow {
    pub icao: String,
    pub type_code: Option<String>,
    pub operator: Option<String>,
    pub is_military: bool,
    pub military_category: Option<String>,
    pub country: Option<String>,
    pub first_seen: f64,
    pub last_seen: f64,
}

impl AircraftRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        AircraftRow {
            icao: row.get("icao"),
            type_code: row.get("type_code"),
            operator: row.get("operator"),
            is_military: row.get("is_military"),
            military_category: row.get("military_category"),
            country: row.get("country"),
            first_seen: row.get("first_seen"),
            last_seen: row.get("last_seen"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PositionRow {
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kts: Option<f64>,
    pub track_deg: Option<f64>,
    pub vertical_rate_fpm: Option<i32>,
    pub timestamp: f64,
}

impl PositionRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        PositionRow {
            icao: row.get("icao"),
            lat: row.get("lat"),
            lon: row.get("lon"),
            altitude_ft: row.get("altitude_ft"),
            ground_speed_kts: row.get("ground_speed_kts"),
            track_deg: row.get("track_deg"),
            vertical_rate_fpm: row.get("vertical_rate_fpm"),
            timestamp: row.get("timestamp"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct FormationRow {
    pub formation_type: String,
    pub lead: String,
    pub members: Vec<String>,
    pub center_lat: f64,
    pub center_lon: f64,
    pub confidence: f64,
    pub last_seen: f64,
}

impl FormationRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        FormationRow {
            formation_type: row.get("formation_type"),
            lead: row.get("lead"),
            members: row.get("members"),
            center_lat: row.get("center_lat"),
            center_lon: row.get("center_lon"),
            confidence: row.get("confidence"),
            last_seen: row.get("last_seen"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ProximityWarningRow {
    pub aircraft_id_1: String,
    pub aircraft_id_2: String,
    pub warning_type: String,
    pub severity: String,
    pub cpa_distance_nm: f64,
    pub cpa_time_min: f64,
    pub confidence: f64,
    pub last_updated: f64,
}

impl ProximityWarningRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        ProximityWarningRow {
            aircraft_id_1: row.get("aircraft_id_1"),
            aircraft_id_2: row.get("aircraft_id_2"),
            warning_type: row.get("warning_type"),
            severity: row.get("severity"),
            cpa_distance_nm: row.get("cpa_distance_nm"),
            cpa_time_min: row.get("cpa_time_min"),
            confidence: row.get("confidence"),
            last_updated: row.get("last_updated"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct TrajectoryRow {
    pub aircraft_id: String,
    pub horizon: String,
    pub predicted_at: f64,
    pub predicted_lat: f64,
    pub predicted_lon: f64,
    pub uncertainty_nm: f64,
    pub confidence: f64,
    pub expiry: f64,
}

impl TrajectoryRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        TrajectoryRow {
            aircraft_id: row.get("aircraft_id"),
            horizon: row.get("horizon"),
            predicted_at: row.get("predicted_at"),
            predicted_lat: row.get("predicted_lat"),
            predicted_lon: row.get("predicted_lon"),
            uncertainty_nm: row.get("uncertainty_nm"),
            confidence: row.get("confidence"),
            expiry: row.get("expiry"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ThreatAssessmentRow {
    pub entity_type: String,
    pub entity_id: String,
    pub score: f64,
    pub level: String,
    pub computed_at: f64,
    pub valid_until: f64,
}

impl ThreatAssessmentRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        ThreatAssessmentRow {
            entity_type: row.get("entity_type"),
            entity_id: row.get("entity_id"),
            score: row.get("score"),
            level: row.get("level"),
            computed_at: row.get("computed_at"),
            valid_until: row.get("valid_until"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AlertRow {
    pub kind: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub aircraft: Vec<String>,
    pub regions: Vec<String>,
    pub timestamp: f64,
}

impl AlertRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        AlertRow {
            kind: row.get("kind"),
            title: row.get("title"),
            description: row.get("description"),
            severity: row.get("severity"),
            aircraft: row.get("aircraft"),
            regions: row.get("regions"),
            timestamp: row.get("timestamp"),
        }
    }
}

/// Parses a 6-char hex ICAO column value, tolerant of rows written by
/// tooling that didn't validate on insert.
pub fn parse_icao_column(s: &str) -> Option<[u8; 3]> {
    icao_from_hex(s)
}

/// Raw position sample feeding the activity-zone clustering pass.
#[derive(Debug)]
pub struct ActivityPositionRow {
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: f64,
}

impl ActivityPositionRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        ActivityPositionRow {
            icao: row.get("icao"),
            lat: row.get("lat"),
            lon: row.get("lon"),
            timestamp: row.get("timestamp"),
        }
    }
}

/// Joined aircraft/position row feeding the formation and proximity
/// scans. Rows with an unparseable ICAO are skipped by the caller.
#[derive(Debug)]
pub struct SnapshotRow {
    pub icao: String,
    pub type_code: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: Option<i32>,
    pub track_deg: Option<f64>,
    pub ground_speed_kts: Option<f64>,
}

impl SnapshotRow {
    pub fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        SnapshotRow {
            icao: row.get("icao"),
            type_code: row.get("type_code"),
            lat: row.get("lat"),
            lon: row.get("lon"),
            altitude_ft: row.get("altitude_ft"),
            track_deg: row.get("track_deg"),
            ground_speed_kts: row.get("ground_speed_kts"),
        }
    }
}
