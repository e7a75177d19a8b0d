//! Proximity / CPA analyzer (§4.H): scans active military positions
//! pairwise and emits warnings for pairs on a converging course.

use crate::config::ProximityConfig;
use crate::geo::{bearing, cpa, distance_nm, Kinematics};
use crate::types::{canonical_pair, Icao, ProximityWarning, Severity, WarningType};

/// One aircraft's state as seen in a proximity-scan snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ProximityEntry {
    pub icao: Icao,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: Option<i32>,
    pub heading_deg: Option<f64>,
    pub speed_kts: Option<f64>,
}

fn heading_diff(a: f64, b: f64) -> f64 {
    let mut d = (a - b).abs() % 360.0;
    if d > 180.0 {
        d = 360.0 - d;
    }
    d
}

fn warning_type(vertical_sep: Option<i32>, heading_delta: Option<f64>) -> WarningType {
    if let Some(v) = vertical_sep {
        if v < 500 {
            return WarningType::SameAltitude;
        }
    }
    if let Some(d) = heading_delta {
        if d < 30.0 {
            return WarningType::ParallelApproach;
        }
        if d > 150.0 {
            return WarningType::Convergence;
        }
        if (60.0..=120.0).contains(&d) {
            return WarningType::Crossing;
        }
    }
    if let Some(v) = vertical_sep {
        if v < 2000 {
            return WarningType::VerticalConflict;
        }
    }
    WarningType::Convergence
}

fn lateral_severity(cpa_dist_nm: f64) -> Severity {
    if cpa_dist_nm < 3.0 {
        Severity::Critical
    } else if cpa_dist_nm < 5.0 {
        Severity::High
    } else if cpa_dist_nm < 10.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn vertical_severity(vertical_sep: i32) -> Severity {
    if vertical_sep < 500 {
        Severity::Critical
    } else if vertical_sep < 1000 {
        Severity::High
    } else if vertical_sep < 2000 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Evaluates one pair and returns a warning if the pair is on a genuine
/// converging course past the confidence/severity/CPA gates.
pub fn evaluate_pair(a: &ProximityEntry, b: &ProximityEntry, cfg: &ProximityConfig) -> Option<ProximityWarning> {
    let raw_distance = distance_nm(a.lat, a.lon, b.lat, b.lon).ok()?;
    if raw_distance > cfg.prefilter_distance_nm {
        return None;
    }

    let vertical_separation_ft = match (a.altitude_ft, b.altitude_ft) {
        (Some(x), Some(y)) => Some((x - y).abs()),
        _ => None,
    };

    let bearing_ab = bearing(a.lat, a.lon, b.lat, b.lon).ok()?;
    let (heading_a, speed_a) = (a.heading_deg.unwrap_or(0.0), a.speed_kts.unwrap_or(0.0));
    let (heading_b, speed_b) = (b.heading_deg.unwrap_or(0.0), b.speed_kts.unwrap_or(0.0));

    let (vax, vay) = (speed_a * heading_a.to_radians().sin(), speed_a * heading_a.to_radians().cos());
    let (vbx, vby) = (speed_b * heading_b.to_radians().sin(), speed_b * heading_b.to_radians().cos());
    let rel_vel = (vax - vbx, vay - vby);
    let bearing_rad = bearing_ab.to_radians();
    let bearing_unit = (bearing_rad.sin(), bearing_rad.cos());
    let closure_rate = -(rel_vel.0 * bearing_unit.0 + rel_vel.1 * bearing_unit.1);

    if closure_rate <= cfg.min_closure_rate_kts {
        return None;
    }

    let (t_cpa_hours, cpa_dist) = cpa(
        Kinematics { lat: a.lat, lon: a.lon, track_deg: heading_a, speed_kts: speed_a },
        Kinematics { lat: b.lat, lon: b.lon, track_deg: heading_b, speed_kts: speed_b },
    )
    .ok()?;

    if t_cpa_hours < 0.0 {
        return None;
    }
    let t_cpa_min = t_cpa_hours * 60.0;
    if t_cpa_min > cfg.max_time_to_cpa_min {
        return None;
    }

    let heading_delta = match (a.heading_deg, b.heading_deg) {
        (Some(ha), Some(hb)) => Some(heading_diff(ha, hb)),
        _ => None,
    };
    let wtype = warning_type(vertical_separation_ft, heading_delta);

    let lateral = lateral_severity(cpa_dist);
    let severity = match vertical_separation_ft {
        Some(v) => lateral.max(vertical_severity(v)),
        None => lateral,
    };

    let mut confidence: f64 = 1.0;
    if a.heading_deg.is_none() {
        confidence -= 0.2;
    }
    if b.heading_deg.is_none() {
        confidence -= 0.2;
    }
    if a.speed_kts.is_none() {
        confidence -= 0.15;
    }
    if b.speed_kts.is_none() {
        confidence -= 0.15;
    }
    if a.altitude_ft.is_none() {
        confidence -= 0.1;
    }
    if b.altitude_ft.is_none() {
        confidence -= 0.1;
    }
    if t_cpa_min > 20.0 {
        confidence -= 0.2;
    } else if t_cpa_min > 10.0 {
        confidence -= 0.1;
    }
    confidence = confidence.max(0.0);

    if cpa_dist >= cfg.warning_cpa_threshold_nm || confidence < cfg.min_confidence {
        return None;
    }

    let (id1, id2) = canonical_pair(a.icao, b.icao);
    Some(ProximityWarning {
        aircraft_id_1: id1,
        aircraft_id_2: id2,
        warning_type: wtype,
        severity,
        cpa_distance_nm: cpa_dist,
        cpa_time_min: t_cpa_min,
        closure_rate_kts: closure_rate,
        vertical_separation_ft: vertical_separation_ft.map(|v| v as i32),
        confidence,
        active: true,
        acknowledged: false,
        last_updated: 0.0,
    })
}

/// Scans all unordered pairs in the snapshot and returns surviving
/// warnings.
pub fn scan(snapshot: &[ProximityEntry], cfg: &ProximityConfig) -> Vec<ProximityWarning> {
    let mut out = Vec::new();
    for i in 0..snapshot.len() {
        for j in (i + 1)..snapshot.len() {
            if let Some(w) = evaluate_pair(&snapshot[i], &snapshot[j], cfg) {
                out.push(w);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;

    #[test]
    fn test_head_on_pair_produces_warning() {
        let cfg = FusionConfig::default().proximity;
        let a = ProximityEntry {
            icao: [0, 0, 1],
            lat: 32.0,
            lon: 34.0,
            altitude_ft: Some(25000),
            heading_deg: Some(90.0),
            speed_kts: Some(500.0),
        };
        let b = ProximityEntry {
            icao: [0, 0, 2],
            lat: 32.0,
            lon: 34.5,
            altitude_ft: Some(25000),
            heading_deg: Some(270.0),
            speed_kts: Some(500.0),
        };
        let warning = evaluate_pair(&a, &b, &cfg).expect("expected a warning");
        assert_eq!(warning.warning_type, WarningType::SameAltitude);
        assert!(warning.cpa_distance_nm < 1.0);
    }

    #[test]
    fn test_prefilter_skips_far_pairs() {
        let cfg = FusionConfig::default().proximity;
        let a = ProximityEntry { icao: [0, 0, 1], lat: 0.0, lon: 0.0, altitude_ft: None, heading_deg: Some(90.0), speed_kts: Some(400.0) };
        let b = ProximityEntry { icao: [0, 0, 2], lat: 0.0, lon: 5.0, altitude_ft: None, heading_deg: Some(270.0), speed_kts: Some(400.0) };
        assert!(evaluate_pair(&a, &b, &cfg).is_none());
    }

    #[test]
    fn test_low_closure_rate_emits_no_warning() {
        let cfg = FusionConfig::default().proximity;
        let a = ProximityEntry { icao: [0, 0, 1], lat: 32.0, lon: 34.0, altitude_ft: Some(25000), heading_deg: Some(90.0), speed_kts: Some(300.0) };
        let b = ProximityEntry { icao: [0, 0, 2], lat: 32.0, lon: 34.1, altitude_ft: Some(25000), heading_deg: Some(90.0), speed_kts: Some(300.0) };
        assert!(evaluate_pair(&a, &b, &cfg).is_none());
    }

    #[test]
    fn test_canonical_pair_ordering_in_warning() {
        let cfg = FusionConfig::default().proximity;
        let a = ProximityEntry { icao: [0, 0, 9], lat: 32.0, lon: 34.0, altitude_ft: Some(25000), heading_deg: Some(90.0), speed_kts: Some(500.0) };
        let b = ProximityEntry { icao: [0, 0, 1], lat: 32.0, lon: 34.5, altitude_ft: Some(25000), heading_deg: Some(270.0), speed_kts: Some(500.0) };
        let warning = evaluate_pair(&a, &b, &cfg).unwrap();
        assert_eq!(warning.aircraft_id_1, [0, 0, 1]);
        assert_eq!(warning.aircraft_id_2, [0, 0, 9]);
    }
}
