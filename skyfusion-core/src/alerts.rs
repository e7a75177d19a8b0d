//! Alert generator (§4.N): turns formation/activity/strategic-movement/
//! news signals into `IntelligenceAlert` records, with a time-windowed
//! duplicate suppression pass — an identical alert may re-fire once its
//! window lapses, unlike a permanent dedup set.

use crate::types::{AlertKind, FormationDetection, FormationType, Icao, IntelligenceAlert, NewsEvent, Severity};

/// Builds a formation alert per §4.N's severity ladder.
pub fn formation_alert(formation: &FormationDetection, now: f64) -> IntelligenceAlert {
    let severity = match formation.formation_type {
        FormationType::StrikePackage if formation.members.len() >= 4 => Severity::Critical,
        FormationType::StrikePackage => Severity::High,
        _ if formation.members.len() >= 6 => Severity::High,
        FormationType::TankerReceiver => Severity::High,
        _ => Severity::Medium,
    };

    IntelligenceAlert {
        kind: AlertKind::Formation,
        title: format!("{:?} formation detected", formation.formation_type),
        description: format!(
            "{} aircraft in a {:?} formation near ({:.2}, {:.2})",
            formation.members.len(), formation.formation_type, formation.center_lat, formation.center_lon
        ),
        severity,
        aircraft: formation.members.clone(),
        regions: Vec::new(),
        news_refs: Vec::new(),
        timestamp: now,
    }
}

/// Activity spike: distinct military hexes seen in the last 10 minutes in
/// a region, compared against a rolling baseline.
pub fn activity_spike_alert(region: &str, count: usize, baseline: f64, aircraft: Vec<Icao>, now: f64) -> Option<IntelligenceAlert> {
    let ratio = if baseline > 0.0 { count as f64 / baseline } else { f64::INFINITY };
    let severity = if ratio >= 3.0 && count >= 6 {
        Severity::Critical
    } else if ratio >= 2.0 && count >= 4 {
        Severity::High
    } else {
        return None;
    };

    Some(IntelligenceAlert {
        kind: AlertKind::ActivitySpike,
        title: format!("Activity spike in {region}"),
        description: format!("{count} distinct military aircraft observed, baseline {baseline:.1}"),
        severity,
        aircraft,
        regions: vec![region.to_string()],
        news_refs: Vec::new(),
        timestamp: now,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategicClass {
    Bomber,
    TankerOrIsr,
    Fighter,
}

/// Strategic movement: repeated sightings of the same strategic type code,
/// or a fighter surge.
pub fn strategic_movement_alert(
    type_code: &str,
    class: StrategicClass,
    count: usize,
    aircraft: Vec<Icao>,
    now: f64,
) -> Option<IntelligenceAlert> {
    let severity = match class {
        StrategicClass::Bomber if count >= 2 => Severity::Critical,
        StrategicClass::TankerOrIsr if count >= 2 => Severity::High,
        StrategicClass::Fighter if count >= 10 => Severity::Critical,
        StrategicClass::Fighter if count >= 6 => Severity::High,
        _ => return None,
    };

    Some(IntelligenceAlert {
        kind: AlertKind::StrategicMovement,
        title: format!("Strategic movement: {type_code}"),
        description: format!("{count} {type_code} aircraft visible in the last 10 minutes"),
        severity,
        aircraft,
        regions: Vec::new(),
        news_refs: Vec::new(),
        timestamp: now,
    })
}

/// Attaches relevant news (published within +/-6h) whose title references
/// a region or event keyword, returning the matching article URLs.
pub fn correlate_news<'a>(alert: &IntelligenceAlert, news: &'a [NewsEvent], window_hours: f64) -> Vec<&'a NewsEvent> {
    news.iter()
        .filter(|n| (n.published_at - alert.timestamp).abs() <= window_hours * 3600.0)
        .filter(|n| {
            alert.regions.iter().any(|r| n.countries.iter().any(|c| c.eq_ignore_ascii_case(r)))
                || alert.regions.iter().any(|r| n.title.to_lowercase().contains(&r.to_lowercase()))
        })
        .collect()
}

/// Composite "flash" alert: summarizes the union of aircraft/regions/news
/// across >=2 critical/high alerts standing at the same time.
pub fn flash_alert(alerts: &[&IntelligenceAlert], now: f64) -> Option<IntelligenceAlert> {
    let severe: Vec<&&IntelligenceAlert> = alerts
        .iter()
        .filter(|a| matches!(a.severity, Severity::Critical | Severity::High))
        .collect();
    if severe.len() < 2 {
        return None;
    }

    let mut aircraft = Vec::new();
    let mut regions = Vec::new();
    let mut news_refs = Vec::new();
    for a in &severe {
        for ac in &a.aircraft {
            if !aircraft.contains(ac) {
                aircraft.push(*ac);
            }
        }
        for r in &a.regions {
            if !regions.contains(r) {
                regions.push(r.clone());
            }
        }
        for n in &a.news_refs {
            if !news_refs.contains(n) {
                news_refs.push(n.clone());
            }
        }
    }

    Some(IntelligenceAlert {
        kind: AlertKind::Composite,
        title: format!("Flash: {} concurrent high-severity alerts", severe.len()),
        description: severe.iter().map(|a| a.title.clone()).collect::<Vec<_>>().join("; "),
        severity: Severity::Critical,
        aircraft,
        regions,
        news_refs,
        timestamp: now,
    })
}

/// Time-windowed duplicate suppression: tracks (kind, title) -> last emit
/// time, rejecting a re-emission within `window_sec` (default 30 min).
/// Unlike a permanent set, an entry ages out and the alert can fire again.
#[derive(Debug, Default)]
pub struct DedupWindow {
    last_emitted: std::collections::HashMap<(AlertKind, String), f64>,
}

impl DedupWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records the emission if `alert` clears the window;
    /// returns false (and leaves state untouched) if it's a duplicate.
    pub fn try_emit(&mut self, alert: &IntelligenceAlert, window_sec: f64) -> bool {
        let key = (alert.kind, alert.title.clone());
        if let Some(&last) = self.last_emitted.get(&key) {
            if alert.timestamp - last < window_sec {
                return false;
            }
        }
        self.last_emitted.insert(key, alert.timestamp);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormationType;

    fn formation(ftype: FormationType, members: usize) -> FormationDetection {
        FormationDetection {
            formation_type: ftype,
            lead: [0, 0, 1],
            members: (0..members as u8).map(|i| [0, 0, i]).collect(),
            center_lat: 33.0,
            center_lon: 35.0,
            spread_nm: 5.0,
            avg_heading_deg: 90.0,
            altitude_band_ft: (25000, 26000),
            confidence: 0.8,
            first_detected: 0.0,
            last_seen: 0.0,
            active: true,
        }
    }

    #[test]
    fn test_strike_package_four_aircraft_is_critical() {
        let alert = formation_alert(&formation(FormationType::StrikePackage, 4), 0.0);
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn test_tanker_receiver_is_high() {
        let alert = formation_alert(&formation(FormationType::TankerReceiver, 2), 0.0);
        assert_eq!(alert.severity, Severity::High);
    }

    #[test]
    fn test_activity_spike_requires_ratio_and_count() {
        assert!(activity_spike_alert("region-1", 2, 1.0, Vec::new(), 0.0).is_none());
        let alert = activity_spike_alert("region-1", 6, 2.0, Vec::new(), 0.0).unwrap();
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn test_flash_alert_requires_two_severe() {
        let a1 = IntelligenceAlert {
            kind: AlertKind::Formation,
            title: "a".into(),
            description: "".into(),
            severity: Severity::High,
            aircraft: vec![[0, 0, 1]],
            regions: vec!["Region".into()],
            news_refs: Vec::new(),
            timestamp: 0.0,
        };
        assert!(flash_alert(&[&a1], 0.0).is_none());
        let a2 = IntelligenceAlert { severity: Severity::Critical, title: "b".into(), ..a1.clone() };
        let flash = flash_alert(&[&a1, &a2], 0.0).unwrap();
        assert_eq!(flash.kind, AlertKind::Composite);
        assert_eq!(flash.aircraft.len(), 1);
    }

    #[test]
    fn test_dedup_window_blocks_within_window_allows_after() {
        let mut dedup = DedupWindow::new();
        let mut alert = IntelligenceAlert {
            kind: AlertKind::Formation,
            title: "dup".into(),
            description: "".into(),
            severity: Severity::High,
            aircraft: Vec::new(),
            regions: Vec::new(),
            news_refs: Vec::new(),
            timestamp: 0.0,
        };
        assert!(dedup.try_emit(&alert, 1800.0));
        assert!(!dedup.try_emit(&alert, 1800.0));
        alert.timestamp = 1900.0;
        assert!(dedup.try_emit(&alert, 1800.0));
    }
}
