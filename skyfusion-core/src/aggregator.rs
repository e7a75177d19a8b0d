//! Multi-source merge policy (§4.C). Pure logic: given raw per-source
//! records for the same ICAO hex, produce one merged record. The network
//! fetch, rate limiting, and per-hex cache live in skyfusion-server;
//! this module owns only the in-flight merge map's decision rules,
//! independent of any wire format.

use std::collections::HashMap;

use crate::icao::{classify_military_category, is_military, lookup_country};
use crate::types::{Aircraft, Icao, Position};

/// One upstream's view of a single aircraft, prior to merge.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub icao: Icao,
    pub callsign: Option<String>,
    pub type_code: Option<String>,
    pub operator: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kts: Option<f64>,
    pub track_deg: Option<f64>,
    pub vertical_rate_fpm: Option<i32>,
    pub mil_flag: bool,
    pub seen_sec: Option<f64>,
    pub seen_pos_sec: Option<f64>,
    pub source_name: String,
    /// A nested "last position" payload, promoted into the top-level
    /// lat/lon/seen_pos fields when the top level is null (§4.C position
    /// normalization).
    pub last_position: Option<(f64, f64, Option<f64>)>,
}

/// Result of merging N source records for one hex: the merged aircraft
/// attributes, the merged position (if any), and the set of contributing
/// source names.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub icao: Icao,
    pub callsign: Option<String>,
    pub type_code: Option<String>,
    pub operator: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kts: Option<f64>,
    pub track_deg: Option<f64>,
    pub vertical_rate_fpm: Option<i32>,
    pub mil_flag: bool,
    pub seen_sec: Option<f64>,
    pub seen_pos_sec: Option<f64>,
    pub sources: Vec<String>,
}

fn normalize_position(mut r: SourceRecord) -> SourceRecord {
    if (r.lat.is_none() || r.lon.is_none()) && r.last_position.is_some() {
        let (lat, lon, staleness) = r.last_position.unwrap();
        r.lat = Some(lat);
        r.lon = Some(lon);
        if let Some(s) = staleness {
            r.seen_pos_sec = Some(s);
        }
    }
    r
}

/// Merge two already-normalized records for the same hex. Non-null wins;
/// when both sides carry a value, the left (earlier-seen) side wins,
/// except `seen`/`seen_pos` (minimum) and `mil` (logical OR, corrected by
/// the rule engine afterward).
fn merge_pair(left: MergedRecord, right: SourceRecord) -> MergedRecord {
    let right = normalize_position(right);

    let mut sources = left.sources;
    if !sources.contains(&right.source_name) {
        sources.push(right.source_name.clone());
    }

    MergedRecord {
        icao: left.icao,
        callsign: left.callsign.or(right.callsign),
        type_code: left.type_code.or(right.type_code),
        operator: left.operator.or(right.operator),
        lat: left.lat.or(right.lat),
        lon: left.lon.or(right.lon),
        altitude_ft: left.altitude_ft.or(right.altitude_ft),
        ground_speed_kts: left.ground_speed_kts.or(right.ground_speed_kts),
        track_deg: left.track_deg.or(right.track_deg),
        vertical_rate_fpm: left.vertical_rate_fpm.or(right.vertical_rate_fpm),
        mil_flag: left.mil_flag || right.mil_flag,
        seen_sec: min_option(left.seen_sec, right.seen_sec),
        seen_pos_sec: min_option(left.seen_pos_sec, right.seen_pos_sec),
        sources,
    }
}

fn min_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}

/// Merge every source's record for one hex into a single `MergedRecord`.
/// Records are folded left-to-right in the order given, so callers that
/// want "earlier-seen wins" should order by fetch priority.
pub fn merge_records(icao: Icao, records: Vec<SourceRecord>) -> Option<MergedRecord> {
    let mut iter = records.into_iter();
    let first = normalize_position(iter.next()?);
    let seed = MergedRecord {
        icao,
        callsign: first.callsign,
        type_code: first.type_code,
        operator: first.operator,
        lat: first.lat,
        lon: first.lon,
        altitude_ft: first.altitude_ft,
        ground_speed_kts: first.ground_speed_kts,
        track_deg: first.track_deg,
        vertical_rate_fpm: first.vertical_rate_fpm,
        mil_flag: first.mil_flag,
        seen_sec: first.seen_sec,
        seen_pos_sec: first.seen_pos_sec,
        sources: vec![first.source_name],
    };
    Some(iter.fold(seed, merge_pair))
}

/// Re-runs the military rule engine after merge, unconditionally
/// overwriting `is_military` (corrects both missing flags and false
/// positives from upstreams), and attaches detected category and country.
pub fn reclassify(merged: &MergedRecord, existing: Option<&Aircraft>) -> Aircraft {
    let detected_military = is_military(
        &merged.icao,
        merged.callsign.as_deref(),
        merged.type_code.as_deref(),
        merged.operator.as_deref(),
        merged.mil_flag,
    );
    let category = if detected_military {
        Some(classify_military_category(
            merged.type_code.as_deref(),
            merged.callsign.as_deref(),
        ))
    } else {
        None
    };
    let country = lookup_country(&merged.icao);

    let now = merged.seen_sec.unwrap_or(0.0);
    let mut aircraft = existing.cloned().unwrap_or_else(|| Aircraft::new(merged.icao, now));
    aircraft.type_code = merged.type_code.clone().or(aircraft.type_code);
    aircraft.operator = merged.operator.clone().or(aircraft.operator);
    aircraft.is_military = detected_military;
    aircraft.military_category = category;
    aircraft.country = country.or(aircraft.country);
    aircraft.last_seen = aircraft.last_seen.max(now);
    aircraft
}

/// Converts a merged record into a `Position`, if it carries a usable
/// lat/lon. Returns `None` (not an error) when no source had a position —
/// this is a normal outcome, not a policy violation.
pub fn merged_to_position(merged: &MergedRecord, timestamp: f64) -> Option<Position> {
    let (lat, lon) = (merged.lat?, merged.lon?);
    if Position::validate(lat, lon).is_err() {
        return None;
    }
    Some(Position {
        icao: merged.icao,
        lat,
        lon,
        altitude_ft: merged.altitude_ft,
        ground_speed_kts: merged.ground_speed_kts,
        track_deg: merged.track_deg,
        vertical_rate_fpm: merged.vertical_rate_fpm,
        source: merged.sources.join(","),
        timestamp,
    })
}

/// A fixed bounding box (min_lat, min_lon, max_lat, max_lon) describing
/// the region of interest the aggregator restricts output to.
#[derive(Debug, Clone, Copy)]
pub struct RegionOfInterest {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl RegionOfInterest {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Filters merged positions to those inside the region of interest.
pub fn filter_region(
    positions: HashMap<Icao, Position>,
    region: &RegionOfInterest,
) -> HashMap<Icao, Position> {
    positions
        .into_iter()
        .filter(|(_, p)| region.contains(p.lat, p.lon))
        .collect()
}

// ---------------------------------------------------------------------------
// Unit conversions for OpenSky-style responses (§4.C)
// ---------------------------------------------------------------------------

pub fn meters_to_feet(m: f64) -> f64 {
    m * 3.28084
}

pub fn mps_to_knots(mps: f64) -> f64 {
    mps * 1.944
}

pub fn mps_to_fpm(mps: f64) -> f64 {
    mps * 196.85
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(source: &str) -> SourceRecord {
        SourceRecord {
            icao: [0x01, 0x02, 0x03],
            callsign: None,
            type_code: None,
            operator: None,
            lat: None,
            lon: None,
            altitude_ft: None,
            ground_speed_kts: None,
            track_deg: None,
            vertical_rate_fpm: None,
            mil_flag: false,
            seen_sec: None,
            seen_pos_sec: None,
            source_name: source.into(),
            last_position: None,
        }
    }

    #[test]
    fn test_merge_is_identity_for_single_record_with_itself() {
        let icao = [0x01, 0x02, 0x03];
        let mut r = rec("S1");
        r.lat = Some(33.1);
        r.altitude_ft = Some(35000);
        let merged_once = merge_records(icao, vec![r.clone()]).unwrap();
        let merged_twice = merge_records(icao, vec![r.clone(), r]).unwrap();
        assert_eq!(merged_once.lat, merged_twice.lat);
        assert_eq!(merged_once.altitude_ft, merged_twice.altitude_ft);
    }

    #[test]
    fn test_multi_source_merge_scenario() {
        // record X from S1: alt_baro=null, lat=33.1, flight="ABC123"
        // record X from S2: alt_baro=35000, lat=33.1, flight=null
        let icao = [0x01, 0x02, 0x03];
        let mut s1 = rec("S1");
        s1.lat = Some(33.1);
        s1.lon = Some(35.0);
        s1.callsign = Some("ABC123".into());

        let mut s2 = rec("S2");
        s2.lat = Some(33.1);
        s2.lon = Some(35.0);
        s2.altitude_ft = Some(35000);

        let merged = merge_records(icao, vec![s1, s2]).unwrap();
        assert_eq!(merged.lat, Some(33.1));
        assert_eq!(merged.altitude_ft, Some(35000));
        assert_eq!(merged.callsign, Some("ABC123".into()));
        assert_eq!(merged.sources, vec!["S1".to_string(), "S2".to_string()]);
    }

    #[test]
    fn test_position_normalization_promotes_nested_last_position() {
        let icao = [0x01, 0x02, 0x03];
        let mut s = rec("S1");
        s.last_position = Some((10.0, 20.0, Some(5.0)));
        let merged = merge_records(icao, vec![s]).unwrap();
        assert_eq!(merged.lat, Some(10.0));
        assert_eq!(merged.lon, Some(20.0));
        assert_eq!(merged.seen_pos_sec, Some(5.0));
    }

    #[test]
    fn test_seen_takes_minimum() {
        let icao = [0x01, 0x02, 0x03];
        let mut s1 = rec("S1");
        s1.seen_sec = Some(30.0);
        let mut s2 = rec("S2");
        s2.seen_sec = Some(5.0);
        let merged = merge_records(icao, vec![s1, s2]).unwrap();
        assert_eq!(merged.seen_sec, Some(5.0));
    }

    #[test]
    fn test_mil_flag_ors_across_sources() {
        let icao = [0x01, 0x02, 0x03];
        let s1 = rec("S1");
        let mut s2 = rec("S2");
        s2.mil_flag = true;
        let merged = merge_records(icao, vec![s1, s2]).unwrap();
        assert!(merged.mil_flag);
    }

    #[test]
    fn test_reclassify_detects_military_type_in_civil_hex_block() {
        let icao = [0x01, 0x02, 0x03];
        let mut s = rec("S1");
        s.type_code = Some("F16".into());
        let merged = merge_records(icao, vec![s]).unwrap();
        let aircraft = reclassify(&merged, None);
        assert!(aircraft.is_military);
    }

    #[test]
    fn test_unit_conversions() {
        assert!((meters_to_feet(1000.0) - 3280.84).abs() < 0.01);
        assert!((mps_to_knots(100.0) - 194.4).abs() < 0.01);
        assert!((mps_to_fpm(10.0) - 1968.5).abs() < 0.01);
    }

    #[test]
    fn test_region_of_interest_contains() {
        let roi = RegionOfInterest {
            min_lat: 30.0,
            min_lon: 30.0,
            max_lat: 40.0,
            max_lon: 40.0,
        };
        assert!(roi.contains(35.0, 35.0));
        assert!(!roi.contains(50.0, 35.0));
    }
}
