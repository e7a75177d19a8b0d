//! Pattern detector (§4.D): classifies an ordered track of positions as
//! orbit, racetrack, holding, or tanker-track, using the geometric
//! primitives in `patterns`. Each detector returns `None` rather than a
//! zero-confidence result when its minimum-points gate isn't met — the
//! caller treats "no pattern" and "pattern below threshold" the same way.

use crate::config::DetectorConfig;
use crate::patterns::{
    calculate_angular_velocity, check_area_confinement, detect_racetrack_params,
    find_heading_reversals, fit_circle, total_path_length_nm, Point, RotationDirection,
};
use crate::types::PatternKind;

#[derive(Debug, Clone, Copy)]
pub struct DetectedPattern {
    pub kind: PatternKind,
    pub confidence: f64,
    pub radius_nm: Option<f64>,
    pub center: Option<(f64, f64)>,
    pub revolutions: Option<f64>,
}

fn duration_sec(points: &[Point]) -> f64 {
    match (points.first(), points.last()) {
        (Some(a), Some(b)) => b.timestamp - a.timestamp,
        _ => 0.0,
    }
}

/// Orbit: closed circular track held for at least `orbit_min_duration_sec`
/// with consistent rotation direction. Confidence = circle-fit confidence
/// plus a revolution-count bonus, capped at 1.0.
pub fn detect_orbit(points: &[Point], cfg: &DetectorConfig) -> Option<DetectedPattern> {
    if points.len() < cfg.orbit_min_points {
        return None;
    }
    if duration_sec(points) < cfg.orbit_min_duration_sec {
        return None;
    }

    let fit = fit_circle(points)?;
    if fit.radius_nm < cfg.orbit_min_radius_nm || fit.radius_nm > cfg.orbit_max_radius_nm {
        return None;
    }
    if fit.confidence < cfg.orbit_min_fit_confidence {
        return None;
    }

    let av = calculate_angular_velocity(points);
    if av.consistency < cfg.orbit_min_angular_consistency {
        return None;
    }
    if av.direction == RotationDirection::Indeterminate {
        return None;
    }

    let circumference = 2.0 * std::f64::consts::PI * fit.radius_nm;
    let path_nm = total_path_length_nm(points);
    let revolutions = if circumference > 1e-6 {
        path_nm / circumference
    } else {
        0.0
    };
    if revolutions < cfg.orbit_min_revolutions {
        return None;
    }

    let confidence = (fit.confidence + (revolutions / 2.0).min(1.0) * 0.2).min(1.0);

    Some(DetectedPattern {
        kind: PatternKind::Orbit,
        confidence,
        radius_nm: Some(fit.radius_nm),
        center: Some((fit.center_lat, fit.center_lon)),
        revolutions: Some(revolutions),
    })
}

/// Racetrack: two near-opposite headings traced repeatedly, per
/// `patterns::detect_racetrack_params`.
pub fn detect_racetrack(points: &[Point], cfg: &DetectorConfig) -> Option<DetectedPattern> {
    if points.len() < cfg.racetrack_min_points {
        return None;
    }
    let params = detect_racetrack_params(points)?;
    Some(DetectedPattern {
        kind: PatternKind::Racetrack,
        confidence: params.confidence,
        radius_nm: Some(params.width_nm / 2.0),
        center: None,
        revolutions: None,
    })
}

/// Holding: small confined area with repeated heading reversals.
/// confidence = 0.6 * (1 - area/max_area) + 0.4 * min(1, reversals/4),
/// rejected below `holding_min_confidence`.
pub fn detect_holding(points: &[Point], cfg: &DetectorConfig) -> Option<DetectedPattern> {
    if points.len() < cfg.holding_min_points {
        return None;
    }

    let confinement = check_area_confinement(points, cfg.holding_max_area_nm2)?;
    let reversals = find_heading_reversals(points);
    if reversals.len() < cfg.holding_min_reversals {
        return None;
    }

    let area_term = 1.0 - (confinement.area_nm2 / cfg.holding_max_area_nm2).min(1.0);
    let reversal_term = (reversals.len() as f64 / 4.0).min(1.0);
    let confidence = 0.6 * area_term + 0.4 * reversal_term;

    if confidence < cfg.holding_min_confidence {
        return None;
    }

    Some(DetectedPattern {
        kind: PatternKind::Holding,
        confidence,
        radius_nm: None,
        center: None,
        revolutions: None,
    })
}

/// Tanker track: long, high-altitude, near-straight track held within a
/// stable altitude band for an extended duration, possibly with
/// turnaround reversals at each end (an elongated racetrack). Confidence
/// aggregates altitude stability, duration, length, and straightness (or
/// reversal) bonuses; rejected below `tanker_min_confidence`.
pub fn detect_tanker_track(points: &[Point], cfg: &DetectorConfig) -> Option<DetectedPattern> {
    if points.len() < cfg.holding_min_points {
        return None;
    }
    if duration_sec(points) < cfg.tanker_min_duration_sec {
        return None;
    }

    let altitudes: Vec<f64> = points.iter().filter_map(|p| p.altitude).collect();
    if altitudes.len() < points.len() / 2 {
        return None;
    }
    let alt_avg = altitudes.iter().sum::<f64>() / altitudes.len() as f64;
    if alt_avg < cfg.tanker_alt_min_ft || alt_avg > cfg.tanker_alt_max_ft {
        return None;
    }
    let alt_var = altitudes.iter().map(|a| (a - alt_avg).powi(2)).sum::<f64>() / altitudes.len() as f64;
    let alt_stddev = alt_var.sqrt();
    if alt_stddev > cfg.tanker_alt_stddev_max_ft {
        return None;
    }

    let track_len = total_path_length_nm(points);
    if track_len < cfg.tanker_track_min_nm || track_len > cfg.tanker_track_max_nm {
        return None;
    }

    let alt_score = 1.0 - (alt_stddev / cfg.tanker_alt_stddev_max_ft).min(1.0);
    let duration_score = (duration_sec(points) / (cfg.tanker_min_duration_sec * 2.0)).min(1.0);
    let length_score = (track_len / cfg.tanker_track_max_nm).min(1.0);

    let reversals = find_heading_reversals(points);
    let shape_score = if !reversals.is_empty() {
        cfg.tanker_straightness_threshold
    } else if let Some(fit) = fit_circle(points) {
        (1.0 - fit.confidence).max(cfg.tanker_straightness_threshold)
    } else {
        cfg.tanker_straightness_threshold
    };

    let confidence = (alt_score * 0.35 + duration_score * 0.25 + length_score * 0.2 + shape_score * 0.2)
        .clamp(0.0, 1.0);

    if confidence < cfg.tanker_min_confidence {
        return None;
    }

    Some(DetectedPattern {
        kind: PatternKind::TankerTrack,
        confidence,
        radius_nm: None,
        center: None,
        revolutions: None,
    })
}

/// Runs all detectors and returns the highest-confidence match, if any.
pub fn detect_best(points: &[Point], cfg: &DetectorConfig) -> Option<DetectedPattern> {
    [
        detect_orbit(points, cfg),
        detect_racetrack(points, cfg),
        detect_holding(points, cfg),
        detect_tanker_track(points, cfg),
    ]
    .into_iter()
    .flatten()
    .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use std::f64::consts::PI;

    fn circle_points(center_lat: f64, center_lon: f64, radius_nm: f64, n: usize) -> Vec<Point> {
        let mut pts = Vec::with_capacity(n);
        for i in 0..n {
            let frac = i as f64 / n as f64;
            let angle = 2.0 * PI * frac;
            let bearing_deg = angle.to_degrees();
            let (lat, lon) =
                crate::geo::destination(center_lat, center_lon, bearing_deg, radius_nm).unwrap();
            pts.push(Point {
                lat,
                lon,
                timestamp: i as f64 * 30.0,
                heading: Some((bearing_deg + 90.0) % 360.0),
                altitude: Some(25000.0),
            });
        }
        pts
    }

    #[test]
    fn test_detect_orbit_on_synthetic_circle() {
        // 60 points, 30s apart = 1770s total, comfortably over the 300s gate.
        let pts = circle_points(33.9, 35.5, 10.0, 60);
        let cfg = FusionConfig::default().detector;
        let pattern = detect_orbit(&pts, &cfg).expect("expected orbit detection");
        assert_eq!(pattern.kind, PatternKind::Orbit);
        assert!(pattern.confidence > 0.5, "got {}", pattern.confidence);
        assert!((pattern.radius_nm.unwrap() - 10.0).abs() < 1.0);
    }

    #[test]
    fn test_detect_orbit_rejects_too_few_points() {
        let pts = circle_points(0.0, 0.0, 10.0, 5);
        let cfg = FusionConfig::default().detector;
        assert!(detect_orbit(&pts, &cfg).is_none());
    }

    #[test]
    fn test_detect_holding_on_small_confined_reversal_track() {
        let cfg = FusionConfig::default().detector;
        let mut pts = Vec::new();
        let headings = [10.0, 170.0, 10.0, 170.0, 10.0, 170.0, 10.0, 170.0];
        for (i, h) in headings.iter().enumerate() {
            pts.push(Point {
                lat: 33.0 + (i as f64 * 0.01),
                lon: 35.0,
                timestamp: i as f64 * 60.0,
                heading: Some(*h),
                altitude: Some(20000.0),
            });
        }
        let pattern = detect_holding(&pts, &cfg);
        assert!(pattern.is_some());
        assert!(pattern.unwrap().confidence >= cfg.holding_min_confidence);
    }

    #[test]
    fn test_detect_best_picks_highest_confidence() {
        let pts = circle_points(33.9, 35.5, 10.0, 60);
        let cfg = FusionConfig::default().detector;
        let best = detect_best(&pts, &cfg).unwrap();
        assert_eq!(best.kind, PatternKind::Orbit);
    }
}
