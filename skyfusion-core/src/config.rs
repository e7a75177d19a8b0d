//! Pure numeric tunables shared by the geo/pattern/intelligence pipeline.
//!
//! Every constant named throughout the component design (rate-limit
//! defaults, CPA/proximity thresholds, EMA decay rates, Beta prior
//! parameters, calibration sample-count floor, dwell/stale timeouts) lives
//! here as a single typed struct so callers construct one config and pass
//! it down, rather than each module hard-coding its own copy. I/O-shaped
//! settings (upstream URLs, credentials, the Postgres DSN) are a
//! `skyfusion-server` concern, not this crate's.

#[derive(Debug, Clone, Copy)]
pub struct FusionConfig {
    pub aggregator: AggregatorConfig,
    pub profiler: ProfilerConfig,
    pub detector: DetectorConfig,
    pub formation: FormationConfig,
    pub trajectory: TrajectoryConfig,
    pub proximity: ProximityConfig,
    pub geofence: GeofenceConfig,
    pub context: ContextConfig,
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    pub default_rate_limit_per_min: f64,
    pub cache_ttl_sec: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfilerConfig {
    pub high_lr: f64,
    pub high_lr_sample_count: u32,
    pub low_lr: f64,
    pub minmax_decay: f64,
    pub region_merge_radius_nm: f64,
    pub max_typical_regions: usize,
    pub trained_sample_count: u32,
    pub deviation_z_threshold: f64,
    pub deviation_freq_threshold: f64,
    pub deviation_region_margin_nm: f64,
    pub deviation_hour_activity_threshold: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub orbit_min_points: usize,
    pub orbit_min_duration_sec: f64,
    pub orbit_min_fit_confidence: f64,
    pub orbit_min_radius_nm: f64,
    pub orbit_max_radius_nm: f64,
    pub orbit_min_angular_consistency: f64,
    pub orbit_min_revolutions: f64,
    pub racetrack_min_points: usize,
    pub holding_min_points: usize,
    pub holding_max_area_nm2: f64,
    pub holding_min_reversals: usize,
    pub holding_min_confidence: f64,
    pub tanker_min_duration_sec: f64,
    pub tanker_alt_min_ft: f64,
    pub tanker_alt_max_ft: f64,
    pub tanker_alt_stddev_max_ft: f64,
    pub tanker_track_min_nm: f64,
    pub tanker_track_max_nm: f64,
    pub tanker_straightness_threshold: f64,
    pub tanker_min_confidence: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FormationConfig {
    pub snapshot_window_sec: f64,
    pub tanker_receiver_radius_nm: f64,
    pub escort_radius_nm: f64,
    pub strike_package_radius_nm: f64,
    pub cap_radius_nm: f64,
    pub stale_after_sec: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TrajectoryConfig {
    pub min_ground_speed_kts: f64,
    pub uncertainty_base_5: f64,
    pub uncertainty_base_15: f64,
    pub uncertainty_base_30: f64,
    pub confidence_base_no_profile: f64,
    pub confidence_base_with_profile: f64,
    pub confidence_decay_5: f64,
    pub confidence_decay_15: f64,
    pub confidence_decay_30: f64,
    pub validation_window_min: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProximityConfig {
    pub snapshot_window_sec: f64,
    pub min_ground_speed_kts: f64,
    pub prefilter_distance_nm: f64,
    pub min_closure_rate_kts: f64,
    pub max_time_to_cpa_min: f64,
    pub warning_cpa_threshold_nm: f64,
    pub min_confidence: f64,
    pub stale_after_sec: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct GeofenceConfig {
    pub stale_after_min: f64,
    pub high_priority_dwell_threshold_sec: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextConfig {
    pub infra_distance_scale_nm: f64,
    pub activity_zone_bucket_deg: f64,
    pub activity_zone_radius_nm: f64,
    pub activity_zone_min_aircraft: usize,
    pub activity_zone_stale_hours: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationConfig {
    pub min_sample_count: u32,
    pub max_training_outcomes: usize,
    pub training_iterations: u32,
    pub learning_rate: f64,
    pub ece_bins: usize,
    pub threat_valid_window_hours: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            aggregator: AggregatorConfig {
                default_rate_limit_per_min: 60.0,
                cache_ttl_sec: 60.0,
            },
            profiler: ProfilerConfig {
                high_lr: 0.3,
                high_lr_sample_count: 5,
                low_lr: 0.1,
                minmax_decay: 0.95,
                region_merge_radius_nm: 50.0,
                max_typical_regions: 10,
                trained_sample_count: 10,
                deviation_z_threshold: 2.0,
                deviation_freq_threshold: 0.1,
                deviation_region_margin_nm: 20.0,
                deviation_hour_activity_threshold: 0.02,
            },
            detector: DetectorConfig {
                orbit_min_points: 10,
                orbit_min_duration_sec: 300.0,
                orbit_min_fit_confidence: 0.5,
                orbit_min_radius_nm: 2.0,
                orbit_max_radius_nm: 50.0,
                orbit_min_angular_consistency: 0.3,
                orbit_min_revolutions: 0.5,
                racetrack_min_points: 8,
                holding_min_points: 6,
                holding_max_area_nm2: 50.0,
                holding_min_reversals: 2,
                holding_min_confidence: 0.5,
                tanker_min_duration_sec: 1200.0,
                tanker_alt_min_ft: 18_000.0,
                tanker_alt_max_ft: 40_000.0,
                tanker_alt_stddev_max_ft: 3_000.0,
                tanker_track_min_nm: 30.0,
                tanker_track_max_nm: 200.0,
                tanker_straightness_threshold: 0.7,
                tanker_min_confidence: 0.5,
            },
            formation: FormationConfig {
                snapshot_window_sec: 300.0,
                tanker_receiver_radius_nm: 5.0,
                escort_radius_nm: 10.0,
                strike_package_radius_nm: 20.0,
                cap_radius_nm: 30.0,
                stale_after_sec: 600.0,
            },
            trajectory: TrajectoryConfig {
                min_ground_speed_kts: 50.0,
                uncertainty_base_5: 1.0,
                uncertainty_base_15: 3.0,
                uncertainty_base_30: 6.0,
                confidence_base_no_profile: 0.7,
                confidence_base_with_profile: 0.85,
                confidence_decay_5: 0.95,
                confidence_decay_15: 0.85,
                confidence_decay_30: 0.70,
                validation_window_min: 1.0,
            },
            proximity: ProximityConfig {
                snapshot_window_sec: 300.0,
                min_ground_speed_kts: 50.0,
                prefilter_distance_nm: 40.0,
                min_closure_rate_kts: 50.0,
                max_time_to_cpa_min: 30.0,
                warning_cpa_threshold_nm: 20.0,
                min_confidence: 0.5,
                stale_after_sec: 600.0,
            },
            geofence: GeofenceConfig {
                stale_after_min: 30.0,
                high_priority_dwell_threshold_sec: 1800.0,
            },
            context: ContextConfig {
                infra_distance_scale_nm: 100.0,
                activity_zone_bucket_deg: 0.1,
                activity_zone_radius_nm: 30.0,
                activity_zone_min_aircraft: 3,
                activity_zone_stale_hours: 2.0,
            },
            calibration: CalibrationConfig {
                min_sample_count: 50,
                max_training_outcomes: 1000,
                training_iterations: 1000,
                learning_rate: 0.1,
                ece_bins: 10,
                threat_valid_window_hours: 6.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_spec_orbit_thresholds() {
        let c = FusionConfig::default();
        assert_eq!(c.detector.orbit_min_points, 10);
        assert_eq!(c.detector.orbit_min_radius_nm, 2.0);
        assert_eq!(c.detector.orbit_max_radius_nm, 50.0);
    }

    #[test]
    fn test_default_calibration_floor() {
        let c = FusionConfig::default();
        assert_eq!(c.calibration.min_sample_count, 50);
    }
}
