//! Formation detector (§4.F): runs against a snapshot of active military
//! positions and emits `FormationDetection` candidates for the four
//! recognized formation shapes. Upsert-by-overlapping-aircraft-set is a
//! server-side store concern; this module only produces candidates from a
//! snapshot.

use crate::config::FormationConfig;
use crate::geo::{bearing, distance_nm};
use crate::icao::{is_fighter_type, is_high_value_type, is_tanker_type};
use crate::types::{FormationDetection, FormationType, Icao, PatternKind};

/// One aircraft's state as seen in a formation-detection snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub icao: Icao,
    pub type_code: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: i32,
    pub heading_deg: f64,
    pub recent_pattern: Option<PatternKind>,
}

fn heading_diff(a: f64, b: f64) -> f64 {
    let mut d = (a - b).abs() % 360.0;
    if d > 180.0 {
        d = 360.0 - d;
    }
    d
}

fn centroid_and_spread(entries: &[&SnapshotEntry]) -> (f64, f64, f64) {
    let n = entries.len() as f64;
    let lat = entries.iter().map(|e| e.lat).sum::<f64>() / n;
    let lon = entries.iter().map(|e| e.lon).sum::<f64>() / n;
    let spread = entries
        .iter()
        .filter_map(|e| distance_nm(lat, lon, e.lat, e.lon).ok())
        .fold(0.0_f64, f64::max);
    (lat, lon, spread)
}

fn avg_heading(entries: &[&SnapshotEntry]) -> f64 {
    let (sin_sum, cos_sum) = entries.iter().fold((0.0, 0.0), |(s, c), e| {
        let r = e.heading_deg.to_radians();
        (s + r.sin(), c + r.cos())
    });
    (sin_sum.atan2(cos_sum).to_degrees() + 360.0) % 360.0
}

fn altitude_band(entries: &[&SnapshotEntry]) -> (i32, i32) {
    let min = entries.iter().map(|e| e.altitude_ft).min().unwrap_or(0);
    let max = entries.iter().map(|e| e.altitude_ft).max().unwrap_or(0);
    (min, max)
}

/// tanker_receiver: tankers in FL200-FL350 (20,000-35,000 ft) paired with
/// non-tanker aircraft within 5 nm, same band, heading within 30 degrees.
pub fn detect_tanker_receiver(snapshot: &[SnapshotEntry], cfg: &FormationConfig, now: f64) -> Vec<FormationDetection> {
    let mut out = Vec::new();
    for tanker in snapshot.iter().filter(|e| e.type_code.as_deref().is_some_and(is_tanker_type)) {
        if !(20_000.0..=35_000.0).contains(&(tanker.altitude_ft as f64)) {
            continue;
        }
        let receivers: Vec<&SnapshotEntry> = snapshot
            .iter()
            .filter(|e| e.icao != tanker.icao)
            .filter(|e| !e.type_code.as_deref().is_some_and(is_tanker_type))
            .filter(|e| (20_000.0..=35_000.0).contains(&(e.altitude_ft as f64)))
            .filter(|e| distance_nm(tanker.lat, tanker.lon, e.lat, e.lon).map(|d| d < cfg.tanker_receiver_radius_nm).unwrap_or(false))
            .filter(|e| heading_diff(tanker.heading_deg, e.heading_deg) <= 30.0)
            .collect();
        if receivers.is_empty() {
            continue;
        }

        let mut members = vec![tanker.icao];
        members.extend(receivers.iter().map(|r| r.icao));
        let mut all: Vec<&SnapshotEntry> = vec![tanker];
        all.extend(receivers.iter().copied());
        let (center_lat, center_lon, spread_nm) = centroid_and_spread(&all);

        let mut confidence: f64 = 0.5;
        for r in &receivers {
            if (tanker.altitude_ft - r.altitude_ft).abs() < 2000 {
                confidence += 0.2 / receivers.len() as f64;
            }
            if heading_diff(tanker.heading_deg, r.heading_deg) < 15.0 {
                confidence += 0.3 / receivers.len() as f64;
            }
        }

        out.push(FormationDetection {
            formation_type: FormationType::TankerReceiver,
            lead: tanker.icao,
            members,
            center_lat,
            center_lon,
            spread_nm,
            avg_heading_deg: avg_heading(&all),
            altitude_band_ft: altitude_band(&all),
            confidence: confidence.min(1.0),
            first_detected: now,
            last_seen: now,
            active: true,
        });
    }
    out
}

/// escort: high-value assets (awacs/isr) paired with fighters within 10 nm,
/// heading within 45 degrees. Confidence 0.5 + 0.15/escort, capped 0.95.
pub fn detect_escort(snapshot: &[SnapshotEntry], cfg: &FormationConfig, now: f64) -> Vec<FormationDetection> {
    let mut out = Vec::new();
    for asset in snapshot.iter().filter(|e| e.type_code.as_deref().is_some_and(is_high_value_type)) {
        let escorts: Vec<&SnapshotEntry> = snapshot
            .iter()
            .filter(|e| e.icao != asset.icao)
            .filter(|e| e.type_code.as_deref().is_some_and(is_fighter_type))
            .filter(|e| distance_nm(asset.lat, asset.lon, e.lat, e.lon).map(|d| d < cfg.escort_radius_nm).unwrap_or(false))
            .filter(|e| heading_diff(asset.heading_deg, e.heading_deg) <= 45.0)
            .collect();
        if escorts.is_empty() {
            continue;
        }

        let mut members = vec![asset.icao];
        members.extend(escorts.iter().map(|e| e.icao));
        let mut all: Vec<&SnapshotEntry> = vec![asset];
        all.extend(escorts.iter().copied());
        let (center_lat, center_lon, spread_nm) = centroid_and_spread(&all);

        let confidence = (0.5 + 0.15 * escorts.len() as f64).min(0.95);

        out.push(FormationDetection {
            formation_type: FormationType::Escort,
            lead: asset.icao,
            members,
            center_lat,
            center_lon,
            spread_nm,
            avg_heading_deg: avg_heading(&all),
            altitude_band_ft: altitude_band(&all),
            confidence,
            first_detected: now,
            last_seen: now,
            active: true,
        });
    }
    out
}

/// strike_package: greedy clustering of fighters within 20 nm of a seed,
/// same heading within 30 degrees, requiring at least 3 aircraft.
/// Confidence 0.5 + 0.1*(count-3), capped 0.9.
pub fn detect_strike_package(snapshot: &[SnapshotEntry], cfg: &FormationConfig, now: f64) -> Vec<FormationDetection> {
    let fighters: Vec<&SnapshotEntry> = snapshot
        .iter()
        .filter(|e| e.type_code.as_deref().is_some_and(is_fighter_type))
        .collect();

    let mut used = vec![false; fighters.len()];
    let mut out = Vec::new();

    for seed_idx in 0..fighters.len() {
        if used[seed_idx] {
            continue;
        }
        let seed = fighters[seed_idx];
        let mut cluster = vec![seed_idx];
        for (i, f) in fighters.iter().enumerate() {
            if i == seed_idx || used[i] {
                continue;
            }
            let close = distance_nm(seed.lat, seed.lon, f.lat, f.lon).map(|d| d < cfg.strike_package_radius_nm).unwrap_or(false);
            let aligned = heading_diff(seed.heading_deg, f.heading_deg) <= 30.0;
            if close && aligned {
                cluster.push(i);
            }
        }
        if cluster.len() < 3 {
            continue;
        }
        for &i in &cluster {
            used[i] = true;
        }

        let all: Vec<&SnapshotEntry> = cluster.iter().map(|&i| fighters[i]).collect();
        let (center_lat, center_lon, spread_nm) = centroid_and_spread(&all);
        let confidence = (0.5 + 0.1 * (all.len() as f64 - 3.0)).min(0.9).max(0.5);

        out.push(FormationDetection {
            formation_type: FormationType::StrikePackage,
            lead: seed.icao,
            members: all.iter().map(|e| e.icao).collect(),
            center_lat,
            center_lon,
            spread_nm,
            avg_heading_deg: avg_heading(&all),
            altitude_band_ft: altitude_band(&all),
            confidence,
            first_detected: now,
            last_seen: now,
            active: true,
        });
    }
    out
}

/// cap (combat air patrol): fighters flying an orbit/racetrack pattern
/// within 30 nm of each other, requiring at least 2 aircraft. Confidence
/// 0.6 + 0.1*(count-2), capped 0.85.
pub fn detect_cap(snapshot: &[SnapshotEntry], cfg: &FormationConfig, now: f64) -> Vec<FormationDetection> {
    let patrollers: Vec<&SnapshotEntry> = snapshot
        .iter()
        .filter(|e| e.type_code.as_deref().is_some_and(is_fighter_type))
        .filter(|e| matches!(e.recent_pattern, Some(PatternKind::Orbit) | Some(PatternKind::Racetrack)))
        .collect();

    if patrollers.len() < 2 {
        return Vec::new();
    }

    let mut used = vec![false; patrollers.len()];
    let mut out = Vec::new();

    for seed_idx in 0..patrollers.len() {
        if used[seed_idx] {
            continue;
        }
        let seed = patrollers[seed_idx];
        let mut cluster = vec![seed_idx];
        for (i, p) in patrollers.iter().enumerate() {
            if i == seed_idx || used[i] {
                continue;
            }
            if distance_nm(seed.lat, seed.lon, p.lat, p.lon).map(|d| d < cfg.cap_radius_nm).unwrap_or(false) {
                cluster.push(i);
            }
        }
        if cluster.len() < 2 {
            continue;
        }
        for &i in &cluster {
            used[i] = true;
        }

        let all: Vec<&SnapshotEntry> = cluster.iter().map(|&i| patrollers[i]).collect();
        let (center_lat, center_lon, spread_nm) = centroid_and_spread(&all);
        let confidence = (0.6 + 0.1 * (all.len() as f64 - 2.0)).min(0.85).max(0.6);

        out.push(FormationDetection {
            formation_type: FormationType::Cap,
            lead: seed.icao,
            members: all.iter().map(|e| e.icao).collect(),
            center_lat,
            center_lon,
            spread_nm,
            avg_heading_deg: avg_heading(&all),
            altitude_band_ft: altitude_band(&all),
            confidence,
            first_detected: now,
            last_seen: now,
            active: true,
        });
    }
    out
}

/// Runs all four rules against the snapshot.
pub fn detect_all(snapshot: &[SnapshotEntry], cfg: &FormationConfig, now: f64) -> Vec<FormationDetection> {
    let mut out = Vec::new();
    out.extend(detect_tanker_receiver(snapshot, cfg, now));
    out.extend(detect_escort(snapshot, cfg, now));
    out.extend(detect_strike_package(snapshot, cfg, now));
    out.extend(detect_cap(snapshot, cfg, now));
    out
}

/// Is bearing A->B roughly consistent with heading? helper for future
/// pattern-library comparisons; exposed for the template-matching path.
pub fn relative_bearing(from: &SnapshotEntry, to: &SnapshotEntry) -> Option<f64> {
    bearing(from.lat, from.lon, to.lat, to.lon).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;

    fn entry(icao: Icao, type_code: &str, lat: f64, lon: f64, alt: i32, hdg: f64) -> SnapshotEntry {
        SnapshotEntry {
            icao,
            type_code: Some(type_code.into()),
            lat,
            lon,
            altitude_ft: alt,
            heading_deg: hdg,
            recent_pattern: None,
        }
    }

    #[test]
    fn test_tanker_formation_confidence_at_least_085() {
        let cfg = FusionConfig::default().formation;
        let snapshot = vec![
            entry([0, 0, 1], "K35R", 33.0, 35.0, 25000, 90.0),
            entry([0, 0, 2], "F16", 33.001, 35.001, 25200, 92.0),
        ];
        let formations = detect_tanker_receiver(&snapshot, &cfg, 0.0);
        assert_eq!(formations.len(), 1);
        assert!(formations[0].confidence >= 0.85, "got {}", formations[0].confidence);
    }

    #[test]
    fn test_strike_package_requires_three() {
        let cfg = FusionConfig::default().formation;
        let snapshot = vec![
            entry([0, 0, 1], "F16", 33.0, 35.0, 30000, 90.0),
            entry([0, 0, 2], "F16", 33.02, 35.0, 30000, 92.0),
        ];
        let formations = detect_strike_package(&snapshot, &cfg, 0.0);
        assert!(formations.is_empty());
    }

    #[test]
    fn test_strike_package_detects_three_aligned_fighters() {
        let cfg = FusionConfig::default().formation;
        let snapshot = vec![
            entry([0, 0, 1], "F16", 33.0, 35.0, 30000, 90.0),
            entry([0, 0, 2], "F16", 33.02, 35.0, 30000, 92.0),
            entry([0, 0, 3], "F16", 33.04, 35.0, 30000, 88.0),
        ];
        let formations = detect_strike_package(&snapshot, &cfg, 0.0);
        assert_eq!(formations.len(), 1);
        assert_eq!(formations[0].members.len(), 3);
    }

    #[test]
    fn test_cap_requires_pattern() {
        let cfg = FusionConfig::default().formation;
        let mut a = entry([0, 0, 1], "F16", 33.0, 35.0, 25000, 0.0);
        a.recent_pattern = Some(PatternKind::Orbit);
        let mut b = entry([0, 0, 2], "F16", 33.1, 35.1, 25000, 90.0);
        b.recent_pattern = None;
        let formations = detect_cap(&[a, b], &cfg, 0.0);
        assert!(formations.is_empty());
    }
}
