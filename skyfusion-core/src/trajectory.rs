//! Trajectory predictor (§4.G): projects a short-horizon position for an
//! active military aircraft, with uncertainty that grows with horizon and
//! shrinks near a trained profile's typical regions.

use crate::config::TrajectoryConfig;
use crate::geo::{destination, distance_nm};
use crate::types::{BehavioralProfile, Horizon, Icao, TrajectoryPrediction};

/// Kinematic input for one aircraft at prediction time.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryInput {
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub speed_kts: Option<f64>,
    pub altitude_ft: Option<f64>,
    pub vertical_rate_fpm: Option<f64>,
    pub turn_rate_deg_per_sec: Option<f64>,
}

fn uncertainty_base(cfg: &TrajectoryConfig, horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Min5 => cfg.uncertainty_base_5,
        Horizon::Min15 => cfg.uncertainty_base_15,
        Horizon::Min30 => cfg.uncertainty_base_30,
    }
}

fn confidence_decay(cfg: &TrajectoryConfig, horizon: Horizon) -> f64 {
    match horizon {
        Horizon::Min5 => cfg.confidence_decay_5,
        Horizon::Min15 => cfg.confidence_decay_15,
        Horizon::Min30 => cfg.confidence_decay_30,
    }
}

/// Predicts the position at `horizon` minutes from `now`, or `None` if
/// both heading and speed are unknown (§4.G step 1).
pub fn predict(
    icao: Icao,
    input: &TrajectoryInput,
    horizon: Horizon,
    profile: Option<&BehavioralProfile>,
    now: f64,
    cfg: &TrajectoryConfig,
) -> Option<TrajectoryPrediction> {
    if input.heading_deg.is_none() && input.speed_kts.is_none() {
        return None;
    }
    let speed_eff = input.speed_kts.unwrap_or(0.0);
    let heading_eff = input.heading_deg.unwrap_or(0.0);
    let h = horizon.minutes();

    let mut distance = speed_eff * (h / 60.0);
    let mut projection_heading = heading_eff;

    if let Some(turn_rate) = input.turn_rate_deg_per_sec {
        if turn_rate.abs() > 1e-9 {
            let end_heading = (heading_eff + turn_rate * h * 60.0).rem_euclid(360.0);
            let mut delta = (end_heading - heading_eff).abs() % 360.0;
            if delta > 180.0 {
                delta = 360.0 - delta;
            }
            if delta / 2.0 > 10.0 {
                distance *= (delta / 2.0).to_radians().cos();
            }
            projection_heading = crate::geo::interpolate_angle(heading_eff, end_heading, 0.5);
        }
    }

    let (predicted_lat, predicted_lon) = destination(input.lat, input.lon, projection_heading, distance).ok()?;

    let predicted_altitude_ft = match (input.altitude_ft, input.vertical_rate_fpm) {
        (Some(alt), Some(vr)) => (alt + vr * h).max(0.0),
        (Some(alt), None) => alt,
        _ => 0.0,
    };

    let turn_rate_abs = input.turn_rate_deg_per_sec.map(f64::abs).unwrap_or(0.0);
    let mut uncertainty_nm = uncertainty_base(cfg, horizon)
        + speed_eff * 0.01 * (h / 30.0)
        + if turn_rate_abs > 0.5 { turn_rate_abs * 0.5 * (h / 30.0) } else { 0.0 };

    let is_trained = profile.map(|p| p.is_trained).unwrap_or(false);
    if is_trained {
        let near_typical = profile.unwrap().typical_regions.iter().any(|r| {
            distance_nm(r.center_lat, r.center_lon, predicted_lat, predicted_lon)
                .map(|d| d < r.radius_nm * 1.5)
                .unwrap_or(false)
        });
        uncertainty_nm *= if near_typical { 0.8 } else { 1.2 };
    }

    let base_confidence = if is_trained {
        cfg.confidence_base_with_profile
    } else {
        cfg.confidence_base_no_profile
    };
    let confidence = (base_confidence * confidence_decay(cfg, horizon)).min(0.95);

    Some(TrajectoryPrediction {
        aircraft_id: icao,
        horizon,
        predicted_at: now,
        predicted_lat,
        predicted_lon,
        predicted_heading_deg: projection_heading,
        predicted_speed_kts: speed_eff,
        predicted_altitude_ft,
        uncertainty_nm,
        confidence,
        method: "dead_reckoning",
        expiry: now + h * 60.0 + 300.0,
    })
}

/// Predicts all three horizons, skipping the aircraft entirely if ground
/// speed is at or below the minimum threshold (§4.G preamble).
pub fn predict_all_horizons(
    icao: Icao,
    input: &TrajectoryInput,
    profile: Option<&BehavioralProfile>,
    now: f64,
    cfg: &TrajectoryConfig,
) -> Vec<TrajectoryPrediction> {
    if input.speed_kts.unwrap_or(0.0) <= cfg.min_ground_speed_kts {
        return Vec::new();
    }
    [Horizon::Min5, Horizon::Min15, Horizon::Min30]
        .into_iter()
        .filter_map(|h| predict(icao, input, h, profile, now, cfg))
        .collect()
}

/// A recorded prediction alongside the actual observed position, used by
/// validation (§4.G "Validation").
#[derive(Debug, Clone, Copy)]
pub struct ValidationOutcome {
    pub error_nm: f64,
    pub accurate: bool,
}

/// Validates one prediction against the observed position at target time.
pub fn validate(prediction: &TrajectoryPrediction, actual_lat: f64, actual_lon: f64) -> Option<ValidationOutcome> {
    let error_nm = distance_nm(prediction.predicted_lat, prediction.predicted_lon, actual_lat, actual_lon).ok()?;
    Some(ValidationOutcome {
        error_nm,
        accurate: error_nm <= prediction.uncertainty_nm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;

    fn input(lat: f64, lon: f64, hdg: Option<f64>, speed: Option<f64>) -> TrajectoryInput {
        TrajectoryInput {
            lat,
            lon,
            heading_deg: hdg,
            speed_kts: speed,
            altitude_ft: Some(30000.0),
            vertical_rate_fpm: Some(0.0),
            turn_rate_deg_per_sec: None,
        }
    }

    #[test]
    fn test_no_prediction_without_heading_or_speed() {
        let cfg = FusionConfig::default().trajectory;
        let inp = input(33.0, 35.0, None, None);
        assert!(predict([0, 0, 1], &inp, Horizon::Min5, None, 0.0, &cfg).is_none());
    }

    #[test]
    fn test_confidence_decreases_with_horizon() {
        let cfg = FusionConfig::default().trajectory;
        let inp = input(33.0, 35.0, Some(90.0), Some(400.0));
        let p5 = predict([0, 0, 1], &inp, Horizon::Min5, None, 0.0, &cfg).unwrap();
        let p15 = predict([0, 0, 1], &inp, Horizon::Min15, None, 0.0, &cfg).unwrap();
        let p30 = predict([0, 0, 1], &inp, Horizon::Min30, None, 0.0, &cfg).unwrap();
        assert!(p5.confidence >= p15.confidence);
        assert!(p15.confidence >= p30.confidence);
    }

    #[test]
    fn test_predict_all_horizons_skips_slow_aircraft() {
        let cfg = FusionConfig::default().trajectory;
        let inp = input(33.0, 35.0, Some(90.0), Some(10.0));
        let preds = predict_all_horizons([0, 0, 1], &inp, None, 0.0, &cfg);
        assert!(preds.is_empty());
    }

    #[test]
    fn test_validate_marks_accurate_within_uncertainty() {
        let cfg = FusionConfig::default().trajectory;
        let inp = input(33.0, 35.0, Some(90.0), Some(400.0));
        let p = predict([0, 0, 1], &inp, Horizon::Min5, None, 0.0, &cfg).unwrap();
        let outcome = validate(&p, p.predicted_lat, p.predicted_lon).unwrap();
        assert!(outcome.accurate);
        assert!(outcome.error_nm < 0.01);
    }
}
