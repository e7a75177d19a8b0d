//! Shared data model and error enum for skyfusion-core.
//!
//! Every entity in this module mirrors the system-of-record tables the
//! server persists; skyfusion-core never talks to a database, it only
//! defines and manipulates the typed value the column holds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by skyfusion-core. Core code is pure, so this set
/// is deliberately narrower than the server's `FetchError`: no network or
/// database variants exist here.
#[derive(Debug, Error, PartialEq)]
pub enum SkyError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("policy violation: {0}")]
    Policy(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("profile not trained")]
    NotTrained,
}

pub type Result<T> = std::result::Result<T, SkyError>;

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// 24-bit ICAO aircraft address, stored as raw bytes to avoid per-record
/// allocation. Canonical string form is 6 uppercase hex characters.
pub type Icao = [u8; 3];

/// Format ICAO address as 6-char uppercase hex string.
pub fn icao_to_string(icao: &Icao) -> String {
    format!("{:02X}{:02X}{:02X}", icao[0], icao[1], icao[2])
}

/// Parse a 6-char hex string into an ICAO address.
pub fn icao_from_hex(hex: &str) -> Option<Icao> {
    let hex = hex.trim();
    if hex.len() != 6 {
        return None;
    }
    let val = u32::from_str_radix(hex, 16).ok()?;
    Some(icao_from_u32(val))
}

/// Convert ICAO bytes to u32 for numeric comparisons.
pub fn icao_to_u32(icao: &Icao) -> u32 {
    ((icao[0] as u32) << 16) | ((icao[1] as u32) << 8) | (icao[2] as u32)
}

/// Build ICAO from a 24-bit integer.
pub fn icao_from_u32(val: u32) -> Icao {
    [
        ((val >> 16) & 0xFF) as u8,
        ((val >> 8) & 0xFF) as u8,
        (val & 0xFF) as u8,
    ]
}

// ---------------------------------------------------------------------------
// Aircraft / Position / Flight (§3)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilitaryCategory {
    Tanker,
    Awacs,
    Isr,
    Transport,
    Fighter,
    Helicopter,
    Trainer,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub icao: Icao,
    pub type_code: Option<String>,
    pub operator: Option<String>,
    pub is_military: bool,
    pub military_category: Option<MilitaryCategory>,
    pub country: Option<&'static str>,
    pub first_seen: f64,
    pub last_seen: f64,
}

impl Aircraft {
    pub fn new(icao: Icao, timestamp: f64) -> Self {
        Aircraft {
            icao,
            type_code: None,
            operator: None,
            is_military: false,
            military_category: None,
            country: None,
            first_seen: timestamp,
            last_seen: timestamp,
        }
    }

    /// Non-null wins unless a later trusted source overwrites (§3 Aircraft).
    pub fn merge_attributes(&mut self, other: &Aircraft, trusted: bool) {
        if self.type_code.is_none() || trusted {
            if let Some(t) = &other.type_code {
                self.type_code = Some(t.clone());
            }
        }
        if self.operator.is_none() || trusted {
            if let Some(o) = &other.operator {
                self.operator = Some(o.clone());
            }
        }
        if self.country.is_none() {
            self.country = other.country;
        }
        self.last_seen = self.last_seen.max(other.last_seen);
    }
}

/// A time-stamped sample for one ICAO hex (§3 Position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub icao: Icao,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kts: Option<f64>,
    pub track_deg: Option<f64>,
    pub vertical_rate_fpm: Option<i32>,
    pub source: String,
    pub timestamp: f64,
}

impl Position {
    /// Validates the lat/lon invariant from §3: both present and in range,
    /// or the position is rejected.
    pub fn validate(lat: f64, lon: f64) -> Result<()> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(SkyError::Policy(format!("latitude out of range: {lat}")));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(SkyError::Policy(format!("longitude out of range: {lon}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub icao: Icao,
    pub departure_time: f64,
    pub arrival_time: Option<f64>,
    pub detected_pattern: Option<PatternKind>,
}

// ---------------------------------------------------------------------------
// Behavioral profile (§3, §4.E)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum PatternKind {
    Orbit,
    Racetrack,
    Holding,
    TankerTrack,
    Straight,
}

pub const PATTERN_KINDS: [PatternKind; 5] = [
    PatternKind::Orbit,
    PatternKind::Racetrack,
    PatternKind::Holding,
    PatternKind::TankerTrack,
    PatternKind::Straight,
];

pub fn pattern_index(kind: PatternKind) -> usize {
    PATTERN_KINDS.iter().position(|k| *k == kind).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypicalRegion {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_nm: f64,
    pub frequency: f64,
}

pub const MAX_TYPICAL_REGIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralProfile {
    pub aircraft_id: Icao,
    pub pattern_distribution: [f64; 5],
    pub typical_regions: Vec<TypicalRegion>,
    pub altitude_min: f64,
    pub altitude_max: f64,
    pub altitude_avg: f64,
    pub altitude_stddev: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub speed_avg: f64,
    pub speed_stddev: f64,
    pub hourly_activity: [f64; 24],
    pub daily_activity: [f64; 7],
    pub sample_count: u32,
    pub is_trained: bool,
    pub last_flight_at: Option<f64>,
}

impl BehavioralProfile {
    pub fn blank(aircraft_id: Icao) -> Self {
        BehavioralProfile {
            aircraft_id,
            pattern_distribution: [1.0 / 5.0; 5],
            typical_regions: Vec::new(),
            altitude_min: f64::MAX,
            altitude_max: f64::MIN,
            altitude_avg: 0.0,
            altitude_stddev: 0.0,
            speed_min: f64::MAX,
            speed_max: f64::MIN,
            speed_avg: 0.0,
            speed_stddev: 0.0,
            hourly_activity: [1.0 / 24.0; 24],
            daily_activity: [1.0 / 7.0; 7],
            sample_count: 0,
            is_trained: false,
            last_flight_at: None,
        }
    }

    pub fn pattern_prob(&self, kind: PatternKind) -> f64 {
        self.pattern_distribution[pattern_index(kind)]
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub aircraft_id: Icao,
    pub positions: Vec<Position>,
    pub detected_pattern: Option<PatternKind>,
    pub departure_time: Option<f64>,
    pub now: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub deviation_type: &'static str,
    pub severity: f64,
    pub detected: String,
    pub expected: String,
}

// ---------------------------------------------------------------------------
// Formation (§3, §4.F)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormationType {
    TankerReceiver,
    Escort,
    StrikePackage,
    Cap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationDetection {
    pub formation_type: FormationType,
    pub lead: Icao,
    pub members: Vec<Icao>,
    pub center_lat: f64,
    pub center_lon: f64,
    pub spread_nm: f64,
    pub avg_heading_deg: f64,
    pub altitude_band_ft: (i32, i32),
    pub confidence: f64,
    pub first_detected: f64,
    pub last_seen: f64,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Proximity (§3, §4.H)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningType {
    Convergence,
    SameAltitude,
    ParallelApproach,
    Crossing,
    VerticalConflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityWarning {
    pub aircraft_id_1: Icao,
    pub aircraft_id_2: Icao,
    pub warning_type: WarningType,
    pub severity: Severity,
    pub cpa_distance_nm: f64,
    pub cpa_time_min: f64,
    pub closure_rate_kts: f64,
    pub vertical_separation_ft: Option<i32>,
    pub confidence: f64,
    pub active: bool,
    pub acknowledged: bool,
    pub last_updated: f64,
}

/// Canonicalize a pair so the smaller id is always first (§3 invariant,
/// tested in §8 as "for any proximity pair id_1 < id_2").
pub fn canonical_pair(a: Icao, b: Icao) -> (Icao, Icao) {
    if icao_to_u32(&a) <= icao_to_u32(&b) {
        (a, b)
    } else {
        (b, a)
    }
}

// ---------------------------------------------------------------------------
// Trajectory (§3, §4.G)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    Min5,
    Min15,
    Min30,
}

impl Horizon {
    pub fn minutes(self) -> f64 {
        match self {
            Horizon::Min5 => 5.0,
            Horizon::Min15 => 15.0,
            Horizon::Min30 => 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction {
    pub aircraft_id: Icao,
    pub horizon: Horizon,
    pub predicted_at: f64,
    pub predicted_lat: f64,
    pub predicted_lon: f64,
    pub predicted_heading_deg: f64,
    pub predicted_speed_kts: f64,
    pub predicted_altitude_ft: f64,
    pub uncertainty_nm: f64,
    pub confidence: f64,
    pub method: &'static str,
    pub expiry: f64,
}

// ---------------------------------------------------------------------------
// Geofence (§3, §4.I)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofencePolygon {
    pub id: i64,
    pub owner_id: String,
    pub vertices: Vec<(f64, f64)>,
    pub alert_on_entry: bool,
    pub alert_on_exit: bool,
    pub alert_on_dwell: bool,
    pub dwell_threshold_sec: f64,
    pub aircraft_type_filter: Option<Vec<String>>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeofenceState {
    Outside,
    Inside,
    Dwelling,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceAircraftState {
    pub geofence_id: i64,
    pub aircraft_id_hash: u32,
    pub state: GeofenceState,
    pub entry_lat: f64,
    pub entry_lon: f64,
    pub entry_time: f64,
    pub last_lat: f64,
    pub last_lon: f64,
    pub last_seen: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeofenceTransition {
    Entry,
    Dwell,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceAlert {
    pub geofence_id: i64,
    pub aircraft_id: Icao,
    pub transition: GeofenceTransition,
    pub severity: Severity,
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Intelligence entities (§3, §4.M)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    pub aircraft_id: Icao,
    pub anomaly_type: &'static str,
    pub severity: f64,
    pub detected: String,
    pub expected: String,
    pub factors: Vec<String>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Refueling,
    Surveillance,
    Patrol,
    Training,
    Transit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub aircraft_id: Icao,
    pub intent: Intent,
    pub confidence: f64,
    pub evidence: Vec<String>,
    pub alternatives: Vec<(Intent, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    Minimal,
    Low,
    Elevated,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatComponents {
    pub pattern_anomaly: f64,
    pub regional_tension: f64,
    pub news_correlation: f64,
    pub historical_context: f64,
    pub formation_activity: f64,
    pub location_context: f64,
}

impl ThreatComponents {
    /// Weight budget resolved per the second declaration in the system
    /// overview: sums to 1.00.
    pub fn composite(&self) -> f64 {
        self.pattern_anomaly * 0.20
            + self.regional_tension * 0.15
            + self.news_correlation * 0.20
            + self.historical_context * 0.15
            + self.formation_activity * 0.10
            + self.location_context * 0.20
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub entity_type: String,
    pub entity_id: String,
    pub components: ThreatComponents,
    pub score: f64,
    pub level: ThreatLevel,
    pub computed_at: f64,
    pub valid_until: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub factors: Vec<String>,
    pub top_features: Vec<(String, f64)>,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Calibration state (§3, §4.K, §4.L)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub a: f64,
    pub b: f64,
    pub sample_count: u32,
    pub ece: f64,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        CalibrationModel {
            a: 1.0,
            b: 0.0,
            sample_count: 0,
            ece: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveThreshold {
    pub alpha: f64,
    pub beta: f64,
    pub current_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    pub fn_: u64,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        AdaptiveThreshold {
            alpha: 2.0,
            beta: 2.0,
            current_value: 0.5,
            min_value: 0.1,
            max_value: 0.9,
            tp: 0,
            fp: 0,
            tn: 0,
            fn_: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// News (§3, §6)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub title: String,
    pub published_at: f64,
    pub url: String,
    pub source_domain: String,
    pub countries: Vec<String>,
    pub located_places: Vec<(String, Option<f64>, Option<f64>)>,
    pub entities: Vec<String>,
    pub categories: Vec<String>,
    pub tone: f64,
    pub credibility: f64,
}

// ---------------------------------------------------------------------------
// Alerts (§4.N)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Formation,
    ActivitySpike,
    StrategicMovement,
    Composite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceAlert {
    pub kind: AlertKind,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub aircraft: Vec<Icao>,
    pub regions: Vec<String>,
    pub news_refs: Vec<String>,
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icao_roundtrip() {
        let icao = icao_from_hex("4840D6").unwrap();
        assert_eq!(icao, [0x48, 0x40, 0xD6]);
        assert_eq!(icao_to_string(&icao), "4840D6");
    }

    #[test]
    fn test_icao_to_u32() {
        let icao = [0xA0, 0x00, 0x01];
        assert_eq!(icao_to_u32(&icao), 0xA00001);
    }

    #[test]
    fn test_canonical_pair_orders_by_id() {
        let a = [0x00, 0x00, 0x02];
        let b = [0x00, 0x00, 0x01];
        let (lo, hi) = canonical_pair(a, b);
        assert_eq!(lo, b);
        assert_eq!(hi, a);
    }

    #[test]
    fn test_position_validate_rejects_out_of_range() {
        assert!(Position::validate(91.0, 0.0).is_err());
        assert!(Position::validate(0.0, -181.0).is_err());
        assert!(Position::validate(45.0, 90.0).is_ok());
    }

    #[test]
    fn test_blank_profile_normalizes() {
        let p = BehavioralProfile::blank([0, 0, 0]);
        let sum: f64 = p.pattern_distribution.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        let hsum: f64 = p.hourly_activity.iter().sum();
        assert!((hsum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threat_weight_budget_sums_to_one() {
        let c = ThreatComponents {
            pattern_anomaly: 1.0,
            regional_tension: 1.0,
            news_correlation: 1.0,
            historical_context: 1.0,
            formation_activity: 1.0,
            location_context: 1.0,
        };
        assert!((c.composite() - 1.0).abs() < 1e-9);
    }
}
