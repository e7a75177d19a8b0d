//! Context intelligence (§4.J): scores a point by proximity to
//! infrastructure, containment in airspace polygons, and the activity
//! level of its surrounding zone. The nearest-point scan works over any
//! database-backed infrastructure entity, not a fixed airport table.

use crate::config::ContextConfig;
use crate::geo::distance_nm;
use crate::geofence::point_in_polygon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Critical,
    High,
    Medium,
    Low,
}

impl Importance {
    fn weight(self) -> f64 {
        match self {
            Importance::Critical => 1.0,
            Importance::High => 0.8,
            Importance::Medium => 0.5,
            Importance::Low => 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfrastructureEntity {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub importance: Importance,
}

/// Nearest active infrastructure entity to `(lat, lon)` and its score, if
/// any entities were supplied. Works over any infrastructure entity set,
/// not just a fixed airport table.
pub fn nearest_infrastructure<'a>(
    lat: f64,
    lon: f64,
    entities: &'a [InfrastructureEntity],
    cfg: &ContextConfig,
) -> Option<(&'a InfrastructureEntity, f64, f64)> {
    entities
        .iter()
        .filter_map(|e| distance_nm(lat, lon, e.lat, e.lon).ok().map(|d| (e, d)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(e, dist)| {
            let score = e.importance.weight() * (1.0 - dist / cfg.infra_distance_scale_nm).max(0.0);
            (e, dist, score)
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirspaceClass {
    Prohibited,
    Restricted,
    Danger,
    Moa,
    Tfr,
    Warning,
    Alert,
    Controlled,
}

impl AirspaceClass {
    fn score(self) -> f64 {
        match self {
            AirspaceClass::Prohibited => 1.0,
            AirspaceClass::Restricted => 0.9,
            AirspaceClass::Danger => 0.8,
            AirspaceClass::Moa | AirspaceClass::Tfr => 0.7,
            AirspaceClass::Warning => 0.6,
            AirspaceClass::Alert => 0.5,
            AirspaceClass::Controlled => 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AirspacePolygon {
    pub vertices: Vec<(f64, f64)>,
    pub class: AirspaceClass,
    pub altitude_min_ft: Option<f64>,
    pub altitude_max_ft: Option<f64>,
}

/// Highest class score among airspace polygons containing the point (and,
/// when an altitude is given, whose altitude band brackets it).
pub fn airspace_score(lat: f64, lon: f64, altitude_ft: Option<f64>, polygons: &[AirspacePolygon]) -> f64 {
    polygons
        .iter()
        .filter(|p| point_in_polygon(lat, lon, &p.vertices))
        .filter(|p| match (altitude_ft, p.altitude_min_ft, p.altitude_max_ft) {
            (Some(alt), Some(min), Some(max)) => alt >= min && alt <= max,
            _ => true,
        })
        .map(|p| p.class.score())
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Intense,
    High,
    Moderate,
    Low,
}

impl ActivityLevel {
    fn score(self) -> f64 {
        match self {
            ActivityLevel::Intense => 1.0,
            ActivityLevel::High => 0.8,
            ActivityLevel::Moderate => 0.5,
            ActivityLevel::Low => 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActivityZone {
    pub center_lat: f64,
    pub center_lon: f64,
    pub level: ActivityLevel,
}

pub fn activity_score(lat: f64, lon: f64, zones: &[ActivityZone], cfg: &ContextConfig) -> f64 {
    zones
        .iter()
        .filter(|z| {
            distance_nm(lat, lon, z.center_lat, z.center_lon)
                .map(|d| d < cfg.activity_zone_radius_nm)
                .unwrap_or(false)
        })
        .map(|z| z.level.score())
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntelligenceValue {
    Critical,
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextScore {
    pub infrastructure: f64,
    pub airspace: f64,
    pub activity: f64,
    pub combined: f64,
    pub value: IntelligenceValue,
}

fn classify_value(combined: f64) -> IntelligenceValue {
    if combined >= 0.8 {
        IntelligenceValue::Critical
    } else if combined >= 0.6 {
        IntelligenceValue::High
    } else if combined >= 0.3 {
        IntelligenceValue::Moderate
    } else {
        IntelligenceValue::Low
    }
}

/// Composite context score for a point: 0.35 infra + 0.35 airspace + 0.30
/// activity.
pub fn score_point(
    lat: f64,
    lon: f64,
    altitude_ft: Option<f64>,
    infra: &[InfrastructureEntity],
    airspace: &[AirspacePolygon],
    zones: &[ActivityZone],
    cfg: &ContextConfig,
) -> ContextScore {
    let infra_score = nearest_infrastructure(lat, lon, infra, cfg).map(|(_, _, s)| s).unwrap_or(0.0);
    let airspace_sc = airspace_score(lat, lon, altitude_ft, airspace);
    let activity_sc = activity_score(lat, lon, zones, cfg);
    let combined = 0.35 * infra_score + 0.35 * airspace_sc + 0.30 * activity_sc;

    ContextScore {
        infrastructure: infra_score,
        airspace: airspace_sc,
        activity: activity_sc,
        combined,
        value: classify_value(combined),
    }
}

/// One observed military aircraft within a clustering window, used to
/// refresh activity zones (§4.J "Activity zones are refreshed by...").
#[derive(Debug, Clone, Copy)]
pub struct ActivityObservation {
    pub lat: f64,
    pub lon: f64,
    pub aircraft_hash: u32,
    pub timestamp: f64,
}

/// Clusters recent observations into 0.1deg x 0.1deg buckets, materializing
/// an activity zone wherever at least `min_aircraft` unique hexes were
/// seen within `activity_zone_radius_nm` of the bucket center.
pub fn refresh_activity_zones(
    observations: &[ActivityObservation],
    now: f64,
    cfg: &ContextConfig,
) -> Vec<ActivityZone> {
    use std::collections::{HashMap, HashSet};

    let mut buckets: HashMap<(i64, i64), (Vec<&ActivityObservation>, f64)> = HashMap::new();
    for obs in observations {
        if now - obs.timestamp > cfg.activity_zone_stale_hours * 3600.0 {
            continue;
        }
        let key = (
            (obs.lat / cfg.activity_zone_bucket_deg).floor() as i64,
            (obs.lon / cfg.activity_zone_bucket_deg).floor() as i64,
        );
        let entry = buckets.entry(key).or_insert_with(|| (Vec::new(), obs.timestamp));
        entry.0.push(obs);
        entry.1 = entry.1.max(obs.timestamp);
    }

    let mut zones = Vec::new();
    for ((blat, blon), (obs_list, _latest)) in buckets {
        let center_lat = (blat as f64 + 0.5) * cfg.activity_zone_bucket_deg;
        let center_lon = (blon as f64 + 0.5) * cfg.activity_zone_bucket_deg;
        let nearby: Vec<&&ActivityObservation> = obs_list
            .iter()
            .filter(|o| {
                distance_nm(center_lat, center_lon, o.lat, o.lon)
                    .map(|d| d < cfg.activity_zone_radius_nm)
                    .unwrap_or(false)
            })
            .collect();
        let unique: HashSet<u32> = nearby.iter().map(|o| o.aircraft_hash).collect();
        if unique.len() < cfg.activity_zone_min_aircraft {
            continue;
        }
        let level = if unique.len() >= 10 {
            ActivityLevel::Intense
        } else if unique.len() >= 6 {
            ActivityLevel::High
        } else if unique.len() >= 3 {
            ActivityLevel::Moderate
        } else {
            ActivityLevel::Low
        };
        zones.push(ActivityZone { center_lat, center_lon, level });
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_infrastructure_scores_by_distance() {
        let cfg = ContextConfig {
            infra_distance_scale_nm: 100.0,
            activity_zone_bucket_deg: 0.1,
            activity_zone_radius_nm: 30.0,
            activity_zone_min_aircraft: 3,
            activity_zone_stale_hours: 2.0,
        };
        let entities = vec![InfrastructureEntity {
            name: "Base A".into(),
            lat: 33.0,
            lon: 35.0,
            importance: Importance::Critical,
        }];
        let (_, dist, score) = nearest_infrastructure(33.0, 35.1, &entities, &cfg).unwrap();
        assert!(dist > 0.0);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_airspace_score_requires_containment() {
        let polys = vec![AirspacePolygon {
            vertices: vec![(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)],
            class: AirspaceClass::Prohibited,
            altitude_min_ft: None,
            altitude_max_ft: None,
        }];
        assert_eq!(airspace_score(5.0, 5.0, None, &polys), 1.0);
        assert_eq!(airspace_score(50.0, 50.0, None, &polys), 0.0);
    }

    #[test]
    fn test_combined_score_weighting() {
        let cfg = ContextConfig {
            infra_distance_scale_nm: 100.0,
            activity_zone_bucket_deg: 0.1,
            activity_zone_radius_nm: 30.0,
            activity_zone_min_aircraft: 3,
            activity_zone_stale_hours: 2.0,
        };
        let result = score_point(33.0, 35.0, None, &[], &[], &[], &cfg);
        assert_eq!(result.combined, 0.0);
        assert_eq!(result.value, IntelligenceValue::Low);
    }

    #[test]
    fn test_refresh_activity_zones_requires_min_aircraft() {
        let cfg = ContextConfig {
            infra_distance_scale_nm: 100.0,
            activity_zone_bucket_deg: 0.1,
            activity_zone_radius_nm: 30.0,
            activity_zone_min_aircraft: 3,
            activity_zone_stale_hours: 2.0,
        };
        let obs = vec![
            ActivityObservation { lat: 33.05, lon: 35.05, aircraft_hash: 1, timestamp: 100.0 },
            ActivityObservation { lat: 33.05, lon: 35.05, aircraft_hash: 2, timestamp: 100.0 },
        ];
        let zones = refresh_activity_zones(&obs, 100.0, &cfg);
        assert!(zones.is_empty());
    }
}
