//! Behavioral profiler (§4.E): maintains one EMA-smoothed profile per
//! aircraft, with cold-start priors keyed by type code and a deviation
//! checker used by the intelligence engine.

use crate::config::ProfilerConfig;
use crate::geo::distance_nm;
use crate::types::{
    pattern_index, BehavioralProfile, Deviation, Icao, PatternKind, ProfileUpdate, PATTERN_KINDS,
};

/// A cold-start prior for a type code: an initial pattern distribution and
/// altitude/speed band, applied as if it were three pseudo-observations.
#[derive(Debug, Clone, Copy)]
pub struct ColdStartPrior {
    pub pattern_distribution: [f64; 5],
    pub altitude_avg: f64,
    pub speed_avg: f64,
}

/// Returns the profile to seed a brand-new aircraft: the prior for
/// `type_code` if one is known, else a blank profile. Priors are applied
/// as `sample_count = 3` pseudo-observations (§4.E get_or_create).
pub fn get_or_create(aircraft_id: Icao, type_code: Option<&str>, prior: Option<ColdStartPrior>) -> BehavioralProfile {
    let mut profile = BehavioralProfile::blank(aircraft_id);
    if let (Some(_), Some(prior)) = (type_code, prior) {
        profile.pattern_distribution = prior.pattern_distribution;
        profile.altitude_avg = prior.altitude_avg;
        profile.speed_avg = prior.speed_avg;
        profile.sample_count = 3;
    }
    profile
}

fn renormalize(dist: &mut [f64]) {
    let sum: f64 = dist.iter().sum();
    if sum > 1e-9 {
        for v in dist.iter_mut() {
            *v /= sum;
        }
    }
}

fn mean_and_max_dist(positions: &[crate::types::Position]) -> Option<(f64, f64, f64)> {
    if positions.is_empty() {
        return None;
    }
    let n = positions.len() as f64;
    let centroid_lat = positions.iter().map(|p| p.lat).sum::<f64>() / n;
    let centroid_lon = positions.iter().map(|p| p.lon).sum::<f64>() / n;
    let radius = positions
        .iter()
        .filter_map(|p| distance_nm(centroid_lat, centroid_lon, p.lat, p.lon).ok())
        .fold(0.0_f64, f64::max);
    Some((centroid_lat, centroid_lon, radius))
}

fn ema_update(avg: &mut f64, stddev: &mut f64, min: &mut f64, max: &mut f64, value: f64, decay: f64) {
    *min = min.min(value);
    *max = max.max(value);
    let prev_avg = *avg;
    *avg = decay * *avg + (1.0 - decay) * value;
    let sq_dev = (value - prev_avg).powi(2);
    let prev_var = stddev.powi(2);
    let var = decay * prev_var + (1.0 - decay) * sq_dev;
    *stddev = var.sqrt();
}

/// Applies a behavioral profile update per the six steps of §4.E. Requires
/// at least 2 new positions; returns the profile unchanged otherwise.
pub fn update(mut profile: BehavioralProfile, upd: &ProfileUpdate, cfg: &ProfilerConfig) -> BehavioralProfile {
    if upd.positions.len() < 2 {
        return profile;
    }

    let Some((centroid_lat, centroid_lon, radius)) = mean_and_max_dist(&upd.positions) else {
        return profile;
    };

    // Step 2: pattern distribution EMA.
    if let Some(kind) = upd.detected_pattern {
        let lr = if profile.sample_count < cfg.high_lr_sample_count {
            cfg.high_lr
        } else {
            cfg.low_lr
        };
        let idx = pattern_index(kind);
        for (i, _) in PATTERN_KINDS.iter().enumerate() {
            if i == idx {
                profile.pattern_distribution[i] = profile.pattern_distribution[i] * (1.0 - lr) + lr;
            } else {
                profile.pattern_distribution[i] *= 1.0 - lr;
            }
        }
        renormalize(&mut profile.pattern_distribution);
    }

    // Step 3: typical regions.
    let existing_idx = profile.typical_regions.iter().position(|r| {
        distance_nm(r.center_lat, r.center_lon, centroid_lat, centroid_lon)
            .map(|d| d < cfg.region_merge_radius_nm)
            .unwrap_or(false)
    });
    match existing_idx {
        Some(i) => {
            let r = &mut profile.typical_regions[i];
            let total_freq = r.frequency + 1.0;
            r.center_lat = (r.center_lat * r.frequency + centroid_lat) / total_freq;
            r.center_lon = (r.center_lon * r.frequency + centroid_lon) / total_freq;
            r.radius_nm = r.radius_nm.max(radius);
            r.frequency += 1.0;
        }
        None => {
            if profile.typical_regions.len() < cfg.max_typical_regions {
                profile.typical_regions.push(crate::types::TypicalRegion {
                    center_lat: centroid_lat,
                    center_lon: centroid_lon,
                    radius_nm: radius,
                    frequency: 1.0,
                });
            } else if let Some((lowest_idx, _)) = profile
                .typical_regions
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.frequency.partial_cmp(&b.1.frequency).unwrap())
            {
                profile.typical_regions[lowest_idx] = crate::types::TypicalRegion {
                    center_lat: centroid_lat,
                    center_lon: centroid_lon,
                    radius_nm: radius,
                    frequency: 1.0,
                };
            }
        }
    }
    let freq_sum: f64 = profile.typical_regions.iter().map(|r| r.frequency).sum();
    if freq_sum > 1e-9 {
        for r in profile.typical_regions.iter_mut() {
            r.frequency /= freq_sum;
        }
    }

    // Step 4: altitude/speed min/max/avg/stddev EMA, decay 0.95.
    for p in &upd.positions {
        if let Some(alt) = p.altitude_ft {
            ema_update(
                &mut profile.altitude_avg,
                &mut profile.altitude_stddev,
                &mut profile.altitude_min,
                &mut profile.altitude_max,
                alt as f64,
                cfg.minmax_decay,
            );
        }
        if let Some(speed) = p.ground_speed_kts {
            ema_update(
                &mut profile.speed_avg,
                &mut profile.speed_stddev,
                &mut profile.speed_min,
                &mut profile.speed_max,
                speed,
                cfg.minmax_decay,
            );
        }
    }

    // Step 5: hourly/daily distributions, lr = 0.1.
    for p in &upd.positions {
        let hour = ((p.timestamp / 3600.0) as i64).rem_euclid(24) as usize;
        let day = ((p.timestamp / 86400.0) as i64).rem_euclid(7) as usize;
        for (i, v) in profile.hourly_activity.iter_mut().enumerate() {
            *v = if i == hour {
                *v * (1.0 - cfg.low_lr) + cfg.low_lr
            } else {
                *v * (1.0 - cfg.low_lr)
            };
        }
        for (i, v) in profile.daily_activity.iter_mut().enumerate() {
            *v = if i == day {
                *v * (1.0 - cfg.low_lr) + cfg.low_lr
            } else {
                *v * (1.0 - cfg.low_lr)
            };
        }
    }
    renormalize(&mut profile.hourly_activity);
    renormalize(&mut profile.daily_activity);

    // Step 6.
    profile.sample_count += 1;
    profile.is_trained = profile.sample_count >= cfg.trained_sample_count;
    profile.last_flight_at = Some(upd.departure_time.unwrap_or(upd.now));

    profile
}

fn z_score(value: f64, avg: f64, stddev: f64) -> f64 {
    if stddev < 1e-9 {
        0.0
    } else {
        (value - avg) / stddev
    }
}

/// Checks a new observation against a trained profile per §4.E's five
/// deviation rules. Returns an empty list for an untrained profile.
pub fn check_deviation(
    profile: &BehavioralProfile,
    positions: &[crate::types::Position],
    pattern: Option<PatternKind>,
    current_hour_utc: usize,
    cfg: &ProfilerConfig,
) -> Vec<Deviation> {
    let mut deviations = Vec::new();
    if !profile.is_trained {
        return deviations;
    }

    if let Some(alt) = positions.iter().rev().find_map(|p| p.altitude_ft) {
        let z = z_score(alt as f64, profile.altitude_avg, profile.altitude_stddev);
        if z.abs() > cfg.deviation_z_threshold {
            deviations.push(Deviation {
                deviation_type: "altitude",
                severity: (z.abs() / 5.0).min(1.0),
                detected: format!("{alt} ft"),
                expected: format!("{:.0} ft ± {:.0}", profile.altitude_avg, profile.altitude_stddev),
            });
        }
    }

    if let Some(speed) = positions.iter().rev().find_map(|p| p.ground_speed_kts) {
        let z = z_score(speed, profile.speed_avg, profile.speed_stddev);
        if z.abs() > cfg.deviation_z_threshold {
            deviations.push(Deviation {
                deviation_type: "speed",
                severity: (z.abs() / 5.0).min(1.0),
                detected: format!("{speed:.0} kts"),
                expected: format!("{:.0} kts ± {:.0}", profile.speed_avg, profile.speed_stddev),
            });
        }
    }

    if let Some(kind) = pattern {
        let freq = profile.pattern_prob(kind);
        if freq < cfg.deviation_freq_threshold {
            deviations.push(Deviation {
                deviation_type: "pattern",
                severity: 1.0 - freq,
                detected: format!("{kind:?}"),
                expected: format!("frequency {freq:.3}"),
            });
        }
    }

    if let Some((lat, lon, _, _)) = positions
        .iter()
        .rev()
        .next()
        .map(|p| (p.lat, p.lon, p.altitude_ft, p.ground_speed_kts))
    {
        let within_any = profile.typical_regions.iter().any(|r| {
            distance_nm(r.center_lat, r.center_lon, lat, lon)
                .map(|d| d < r.radius_nm + cfg.deviation_region_margin_nm)
                .unwrap_or(false)
        });
        if !within_any && !profile.typical_regions.is_empty() {
            deviations.push(Deviation {
                deviation_type: "region",
                severity: 0.7,
                detected: format!("({lat:.3}, {lon:.3})"),
                expected: "within a typical region".to_string(),
            });
        }
    }

    if profile.hourly_activity[current_hour_utc.min(23)] < cfg.deviation_hour_activity_threshold {
        deviations.push(Deviation {
            deviation_type: "time",
            severity: 0.5,
            detected: format!("hour {current_hour_utc}"),
            expected: "typical activity hours".to_string(),
        });
    }

    deviations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::types::Position;

    fn pos(icao: Icao, lat: f64, lon: f64, alt: i32, speed: f64, ts: f64) -> Position {
        Position {
            icao,
            lat,
            lon,
            altitude_ft: Some(alt),
            ground_speed_kts: Some(speed),
            track_deg: Some(90.0),
            vertical_rate_fpm: Some(0),
            source: "test".into(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_get_or_create_blank_when_no_prior() {
        let p = get_or_create([0, 0, 1], None, None);
        assert_eq!(p.sample_count, 0);
        assert!(!p.is_trained);
    }

    #[test]
    fn test_get_or_create_applies_prior_as_three_pseudo_observations() {
        let prior = ColdStartPrior {
            pattern_distribution: [0.6, 0.1, 0.1, 0.1, 0.1],
            altitude_avg: 30000.0,
            speed_avg: 450.0,
        };
        let p = get_or_create([0, 0, 1], Some("K35R"), Some(prior));
        assert_eq!(p.sample_count, 3);
        assert_eq!(p.altitude_avg, 30000.0);
    }

    #[test]
    fn test_update_requires_at_least_two_positions() {
        let cfg = FusionConfig::default().profiler;
        let profile = BehavioralProfile::blank([0, 0, 1]);
        let upd = ProfileUpdate {
            aircraft_id: [0, 0, 1],
            positions: vec![pos([0, 0, 1], 33.0, 35.0, 30000, 400.0, 0.0)],
            detected_pattern: None,
            departure_time: None,
            now: 0.0,
        };
        let updated = update(profile.clone(), &upd, &cfg);
        assert_eq!(updated.sample_count, profile.sample_count);
    }

    #[test]
    fn test_repeated_identical_updates_converge_within_decay_bound() {
        let cfg = FusionConfig::default().profiler;
        let mut profile = BehavioralProfile::blank([0, 0, 1]);
        profile.altitude_avg = 20000.0;

        let target = 30000.0;
        let upd = ProfileUpdate {
            aircraft_id: [0, 0, 1],
            positions: vec![
                pos([0, 0, 1], 33.0, 35.0, target as i32, 400.0, 0.0),
                pos([0, 0, 1], 33.01, 35.01, target as i32, 400.0, 10.0),
            ],
            detected_pattern: None,
            departure_time: None,
            now: 0.0,
        };

        let initial_gap = (target - profile.altitude_avg).abs();
        let mut p = profile.clone();
        for _ in 0..5 {
            p = update(p, &upd, &cfg);
        }
        let remaining_gap = (target - p.altitude_avg).abs();
        let bound = initial_gap * cfg.minmax_decay.powi(10);
        assert!(remaining_gap <= bound + 1.0, "gap {remaining_gap} exceeds bound {bound}");
    }

    #[test]
    fn test_check_deviation_empty_when_untrained() {
        let cfg = FusionConfig::default().profiler;
        let profile = BehavioralProfile::blank([0, 0, 1]);
        let positions = vec![pos([0, 0, 1], 33.0, 35.0, 80000, 900.0, 0.0)];
        let deviations = check_deviation(&profile, &positions, None, 3, &cfg);
        assert!(deviations.is_empty());
    }

    #[test]
    fn test_check_deviation_altitude_severity_near_one() {
        let cfg = FusionConfig::default().profiler;
        let mut profile = BehavioralProfile::blank([0, 0, 1]);
        profile.is_trained = true;
        profile.altitude_avg = 25000.0;
        profile.altitude_stddev = 2000.0;
        // z = (50000-25000)/2000 = 12.5 -> severity min(12.5/5,1) = 1.0
        let positions = vec![pos([0, 0, 1], 33.0, 35.0, 50000, 400.0, 0.0)];
        let deviations = check_deviation(&profile, &positions, None, 3, &cfg);
        let alt_dev = deviations.iter().find(|d| d.deviation_type == "altitude").unwrap();
        assert!((alt_dev.severity - 1.0).abs() < 1e-6);
    }
}
