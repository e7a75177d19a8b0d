//! Intelligence engine (§4.M): composes the profiler, formation, context,
//! and calibration/threshold components into anomaly detection, intent
//! classification, and composite threat assessment.

use crate::calibration::calibrate;
use crate::config::{CalibrationConfig, ProfilerConfig};
use crate::threshold::apply;
use crate::types::{
    AnomalyDetection, BehavioralProfile, CalibrationModel, Deviation, Icao, Intent,
    IntentClassification, MilitaryCategory, PatternKind, ThreatComponents, ThreatLevel,
};

fn deviation_factors(deviation_type: &str) -> Vec<String> {
    match deviation_type {
        "altitude" => vec!["altitude deviation".to_string()],
        "speed" => vec!["speed deviation".to_string()],
        "pattern" => vec!["unusual pattern".to_string()],
        "region" => vec!["unusual region".to_string()],
        "time" => vec!["unusual time".to_string()],
        _ => vec!["erratic track".to_string()],
    }
}

/// Runs the profiler's deviation check, then calibrates each surviving
/// deviation's severity and filters by the adaptive "anomaly" threshold.
pub fn detect_anomalies(
    aircraft_id: Icao,
    profile: &BehavioralProfile,
    positions: &[crate::types::Position],
    pattern: Option<PatternKind>,
    current_hour_utc: usize,
    deviation_threshold: &crate::types::AdaptiveThreshold,
    calibration: &CalibrationModel,
    profiler_cfg: &ProfilerConfig,
    calibration_cfg: &CalibrationConfig,
    now: f64,
) -> Vec<AnomalyDetection> {
    let deviations: Vec<Deviation> =
        crate::profiler::check_deviation(profile, positions, pattern, current_hour_utc, profiler_cfg);

    deviations
        .into_iter()
        .filter_map(|d| {
            let calibrated = calibrate(calibration, d.severity, calibration_cfg);
            let result = apply(deviation_threshold, calibrated);
            if !result.exceeds {
                return None;
            }
            Some(AnomalyDetection {
                aircraft_id,
                anomaly_type: match d.deviation_type {
                    "altitude" => "altitude",
                    "speed" => "speed",
                    "pattern" => "pattern",
                    "region" => "region",
                    "time" => "time",
                    _ => "other",
                },
                severity: calibrated,
                detected: d.detected.clone(),
                expected: d.expected.clone(),
                factors: deviation_factors(d.deviation_type),
                timestamp: now,
            })
        })
        .collect()
}

/// Heuristic intent classification (§4.M): tanker, ISR/AWACS, fighter,
/// trainer, and holding rules, in priority order.
pub fn classify_intent(
    aircraft_id: Icao,
    category: Option<MilitaryCategory>,
    pattern: Option<PatternKind>,
    nearby_non_tanker_within_10nm: usize,
) -> IntentClassification {
    let mut alternatives = Vec::new();

    if category == Some(MilitaryCategory::Tanker) && nearby_non_tanker_within_10nm >= 1 {
        alternatives.push((Intent::Transit, 0.2));
        return IntentClassification {
            aircraft_id,
            intent: Intent::Refueling,
            confidence: 0.8,
            evidence: vec!["tanker type with nearby receiver aircraft".to_string()],
            alternatives,
        };
    }

    let is_patrol_pattern = matches!(pattern, Some(PatternKind::Orbit) | Some(PatternKind::Racetrack));

    if matches!(category, Some(MilitaryCategory::Isr) | Some(MilitaryCategory::Awacs)) && is_patrol_pattern {
        return IntentClassification {
            aircraft_id,
            intent: Intent::Surveillance,
            confidence: 0.75,
            evidence: vec!["ISR/AWACS category flying an orbit or racetrack pattern".to_string()],
            alternatives: vec![(Intent::Patrol, 0.25)],
        };
    }

    if category == Some(MilitaryCategory::Fighter) && is_patrol_pattern {
        return IntentClassification {
            aircraft_id,
            intent: Intent::Patrol,
            confidence: 0.6,
            evidence: vec!["fighter type flying an orbit or racetrack pattern".to_string()],
            alternatives: vec![(Intent::Training, 0.2)],
        };
    }

    if category == Some(MilitaryCategory::Trainer) {
        return IntentClassification {
            aircraft_id,
            intent: Intent::Training,
            confidence: 0.7,
            evidence: vec!["trainer type code".to_string()],
            alternatives: Vec::new(),
        };
    }

    if pattern == Some(PatternKind::Holding) {
        return IntentClassification {
            aircraft_id,
            intent: Intent::Patrol,
            confidence: 0.55,
            evidence: vec!["holding pattern without a more specific rule".to_string()],
            alternatives: vec![(Intent::Transit, 0.3)],
        };
    }

    IntentClassification {
        aircraft_id,
        intent: Intent::Transit,
        confidence: 0.5,
        evidence: vec!["no specific intent rule matched".to_string()],
        alternatives: Vec::new(),
    }
}

fn classify_level(score: f64) -> ThreatLevel {
    if score >= 0.8 {
        ThreatLevel::Critical
    } else if score >= 0.6 {
        ThreatLevel::High
    } else if score >= 0.4 {
        ThreatLevel::Elevated
    } else if score >= 0.2 {
        ThreatLevel::Low
    } else {
        ThreatLevel::Minimal
    }
}

/// Six-weight composite threat assessment for one entity.
pub fn assess_threat(
    entity_type: &str,
    entity_id: &str,
    components: ThreatComponents,
    now: f64,
    cfg: &CalibrationConfig,
) -> crate::types::ThreatAssessment {
    let score = components.composite();
    let level = classify_level(score);
    crate::types::ThreatAssessment {
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        components,
        score,
        level,
        computed_at: now,
        valid_until: now + cfg.threat_valid_window_hours * 3600.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_intent_tanker_refueling() {
        let result = classify_intent([0, 0, 1], Some(MilitaryCategory::Tanker), None, 2);
        assert_eq!(result.intent, Intent::Refueling);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_classify_intent_isr_surveillance() {
        let result = classify_intent([0, 0, 1], Some(MilitaryCategory::Isr), Some(PatternKind::Orbit), 0);
        assert_eq!(result.intent, Intent::Surveillance);
    }

    #[test]
    fn test_classify_intent_trainer() {
        let result = classify_intent([0, 0, 1], Some(MilitaryCategory::Trainer), None, 0);
        assert_eq!(result.intent, Intent::Training);
    }

    #[test]
    fn test_assess_threat_composite_score_matches_weights() {
        let cfg = CalibrationConfig {
            min_sample_count: 50,
            max_training_outcomes: 1000,
            training_iterations: 1000,
            learning_rate: 0.1,
            ece_bins: 10,
            threat_valid_window_hours: 6.0,
        };
        let components = ThreatComponents {
            pattern_anomaly: 1.0,
            regional_tension: 0.0,
            news_correlation: 0.0,
            historical_context: 0.0,
            formation_activity: 0.0,
            location_context: 0.0,
        };
        let assessment = assess_threat("aircraft", "A00001", components, 0.0, &cfg);
        assert!((assessment.score - 0.20).abs() < 1e-9);
        assert_eq!(assessment.level, ThreatLevel::Minimal);
    }

    #[test]
    fn test_assess_threat_expires_after_validity_window() {
        let cfg = CalibrationConfig {
            min_sample_count: 50,
            max_training_outcomes: 1000,
            training_iterations: 1000,
            learning_rate: 0.1,
            ece_bins: 10,
            threat_valid_window_hours: 6.0,
        };
        let components = ThreatComponents {
            pattern_anomaly: 0.0,
            regional_tension: 0.0,
            news_correlation: 0.0,
            historical_context: 0.0,
            formation_activity: 0.0,
            location_context: 0.0,
        };
        let assessment = assess_threat("aircraft", "A00001", components, 1000.0, &cfg);
        assert_eq!(assessment.valid_until, 1000.0 + 6.0 * 3600.0);
    }
}
