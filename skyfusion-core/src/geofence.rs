//! Geofence monitor (§4.I): tracks the outside → inside → dwelling →
//! outside state machine per (geofence, aircraft) pair, using point-in-
//! polygon containment. Idempotent: repeated calls with the same
//! inside-set never emit a duplicate alert.

use crate::types::{
    GeofenceAircraftState, GeofenceAlert, GeofencePolygon, GeofenceState, GeofenceTransition, Icao,
    Severity,
};

/// Ray-casting point-in-polygon test. `vertices` is an ordered ring
/// (lat, lon); closure (last == first) is not required.
pub fn point_in_polygon(lat: f64, lon: f64, vertices: &[(f64, f64)]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        let (lat_i, lon_i) = vertices[i];
        let (lat_j, lon_j) = vertices[j];
        if ((lon_i > lon) != (lon_j > lon))
            && (lat < (lat_j - lat_i) * (lon - lon_i) / (lon_j - lon_i) + lat_i)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn is_high_priority_type(aircraft_type_code: Option<&str>) -> bool {
    match aircraft_type_code {
        Some(t) => {
            crate::icao::is_fighter_type(t) || crate::icao::is_high_value_type(t)
        }
        None => false,
    }
}

/// Evaluates one aircraft against one geofence given its prior state (if
/// any), returning the new state and any alert to emit. Call sites own
/// storage of `GeofenceAircraftState` keyed by (geofence_id, aircraft hash).
pub fn evaluate(
    geofence: &GeofencePolygon,
    prior: Option<GeofenceAircraftState>,
    aircraft_id: Icao,
    aircraft_id_hash: u32,
    aircraft_type_code: Option<&str>,
    lat: f64,
    lon: f64,
    now: f64,
    dwell_threshold_sec: f64,
) -> (Option<GeofenceAircraftState>, Option<GeofenceAlert>) {
    let inside = point_in_polygon(lat, lon, &geofence.vertices);
    let high_priority = is_high_priority_type(aircraft_type_code);

    match prior {
        None => {
            if inside {
                let new_state = GeofenceAircraftState {
                    geofence_id: geofence.id,
                    aircraft_id_hash,
                    state: GeofenceState::Inside,
                    entry_lat: lat,
                    entry_lon: lon,
                    entry_time: now,
                    last_lat: lat,
                    last_lon: lon,
                    last_seen: now,
                };
                let alert = geofence.alert_on_entry.then(|| GeofenceAlert {
                    geofence_id: geofence.id,
                    aircraft_id,
                    transition: GeofenceTransition::Entry,
                    severity: Severity::Medium,
                    timestamp: now,
                });
                (Some(new_state), alert)
            } else {
                (None, None)
            }
        }
        Some(mut state) => {
            match (state.state, inside) {
                (GeofenceState::Outside, true) => {
                    state.state = GeofenceState::Inside;
                    state.entry_lat = lat;
                    state.entry_lon = lon;
                    state.entry_time = now;
                    state.last_lat = lat;
                    state.last_lon = lon;
                    state.last_seen = now;
                    let alert = geofence.alert_on_entry.then(|| GeofenceAlert {
                        geofence_id: geofence.id,
                        aircraft_id,
                        transition: GeofenceTransition::Entry,
                        severity: Severity::Medium,
                        timestamp: now,
                    });
                    (Some(state), alert)
                }
                (GeofenceState::Inside, true) => {
                    state.last_lat = lat;
                    state.last_lon = lon;
                    state.last_seen = now;
                    if now - state.entry_time >= dwell_threshold_sec {
                        state.state = GeofenceState::Dwelling;
                        let alert = geofence.alert_on_dwell.then(|| {
                            let dwell_sec = now - state.entry_time;
                            let severity = if dwell_sec > 1800.0 || high_priority {
                                Severity::High
                            } else {
                                Severity::Medium
                            };
                            GeofenceAlert {
                                geofence_id: geofence.id,
                                aircraft_id,
                                transition: GeofenceTransition::Dwell,
                                severity,
                                timestamp: now,
                            }
                        });
                        (Some(state), alert)
                    } else {
                        (Some(state), None)
                    }
                }
                (GeofenceState::Dwelling, true) => {
                    state.last_lat = lat;
                    state.last_lon = lon;
                    state.last_seen = now;
                    (Some(state), None)
                }
                (GeofenceState::Inside, false) | (GeofenceState::Dwelling, false) => {
                    let dwell_sec = now - state.entry_time;
                    state.state = GeofenceState::Outside;
                    state.last_lat = lat;
                    state.last_lon = lon;
                    state.last_seen = now;
                    let alert = geofence.alert_on_exit.then(|| {
                        let severity = if dwell_sec > 1800.0 || high_priority {
                            Severity::High
                        } else {
                            Severity::Low
                        };
                        GeofenceAlert {
                            geofence_id: geofence.id,
                            aircraft_id,
                            transition: GeofenceTransition::Exit,
                            severity,
                            timestamp: now,
                        }
                    });
                    (Some(state), alert)
                }
                (GeofenceState::Outside, false) => {
                    state.last_lat = lat;
                    state.last_lon = lon;
                    state.last_seen = now;
                    (Some(state), None)
                }
            }
        }
    }
}

/// Reverts any tracked state whose `last_seen` predates the stale cutoff
/// back to `Outside` without emitting an alert, per §4.I's stale-state
/// rule.
pub fn expire_stale(state: &mut GeofenceAircraftState, now: f64, stale_after_sec: f64) {
    if state.state != GeofenceState::Outside && now - state.last_seen > stale_after_sec {
        state.state = GeofenceState::Outside;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> GeofencePolygon {
        GeofencePolygon {
            id: 1,
            owner_id: "test".into(),
            vertices: vec![
                (min_lat, min_lon),
                (min_lat, max_lon),
                (max_lat, max_lon),
                (max_lat, min_lon),
            ],
            alert_on_entry: true,
            alert_on_exit: true,
            alert_on_dwell: true,
            dwell_threshold_sec: 1800.0,
            aircraft_type_filter: None,
            is_active: true,
        }
    }

    #[test]
    fn test_point_in_polygon_basic() {
        assert!(point_in_polygon(5.0, 5.0, &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]));
        assert!(!point_in_polygon(15.0, 15.0, &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]));
    }

    #[test]
    fn test_outside_to_inside_emits_entry() {
        let geofence = square(0.0, 0.0, 10.0, 10.0);
        let (state, alert) = evaluate(&geofence, None, [0, 0, 1], 1, None, 5.0, 5.0, 0.0, 1800.0);
        assert!(state.is_some());
        assert_eq!(state.unwrap().state, GeofenceState::Inside);
        assert_eq!(alert.unwrap().transition, GeofenceTransition::Entry);
    }

    #[test]
    fn test_dwell_transition_after_threshold() {
        let geofence = square(0.0, 0.0, 10.0, 10.0);
        let (state1, _) = evaluate(&geofence, None, [0, 0, 1], 1, None, 5.0, 5.0, 0.0, 1800.0);
        let (state2, alert2) = evaluate(&geofence, state1, [0, 0, 1], 1, None, 5.0, 5.0, 1900.0, 1800.0);
        assert_eq!(state2.unwrap().state, GeofenceState::Dwelling);
        assert_eq!(alert2.unwrap().transition, GeofenceTransition::Dwell);
    }

    #[test]
    fn test_idempotent_repeated_calls_emit_no_duplicate_alerts() {
        let geofence = square(0.0, 0.0, 10.0, 10.0);
        let (state1, alert1) = evaluate(&geofence, None, [0, 0, 1], 1, None, 5.0, 5.0, 0.0, 1800.0);
        assert!(alert1.is_some());
        let (state2, alert2) = evaluate(&geofence, state1, [0, 0, 1], 1, None, 5.0, 5.0, 10.0, 1800.0);
        assert!(alert2.is_none());
        assert_eq!(state2.unwrap().state, GeofenceState::Inside);
    }

    #[test]
    fn test_inside_to_outside_emits_exit() {
        let geofence = square(0.0, 0.0, 10.0, 10.0);
        let (state1, _) = evaluate(&geofence, None, [0, 0, 1], 1, None, 5.0, 5.0, 0.0, 1800.0);
        let (state2, alert2) = evaluate(&geofence, state1, [0, 0, 1], 1, None, 15.0, 15.0, 10.0, 1800.0);
        assert_eq!(state2.unwrap().state, GeofenceState::Outside);
        assert_eq!(alert2.unwrap().transition, GeofenceTransition::Exit);
    }
}
