//! OpenSky-style `/states/all` client (§6). Response shape is a flat
//! array-of-arrays (no field names on the wire), so each state vector is
//! decoded positionally.

use serde::Deserialize;
use serde_json::Value;

use skyfusion_core::aggregator::{meters_to_feet, mps_to_fpm, mps_to_knots, SourceRecord};
use skyfusion_core::types::Icao;

use crate::errors::FetchError;

#[derive(Debug, Deserialize)]
struct StatesResponse {
    #[allow(dead_code)]
    time: i64,
    states: Option<Vec<Vec<Value>>>,
}

fn as_str(v: &Value) -> Option<String> {
    v.as_str().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn parse_icao24(hex: &str) -> Option<Icao> {
    let bytes = hex.trim().as_bytes();
    if bytes.len() != 6 {
        return None;
    }
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = u8::from_str_radix(std::str::from_utf8(&bytes[i * 2..i * 2 + 2]).ok()?, 16).ok()?;
    }
    Some(out)
}

/// Decodes one state vector. Index layout per §6: [icao24, callsign,
/// origin_country, time_position, last_contact, lon, lat, baro_alt_m,
/// on_ground, vel_m_s, true_track, vert_rate_m_s, sensors, geo_alt_m,
/// squawk, spi, position_source, category].
fn to_record(state: &[Value], now: f64) -> Option<SourceRecord> {
    let icao = parse_icao24(state.first()?.as_str()?)?;
    let callsign = state.get(1).and_then(as_str);
    let last_contact = state.get(4).and_then(as_f64);
    let lon = state.get(5).and_then(as_f64);
    let lat = state.get(6).and_then(as_f64);
    let alt_m = state.get(7).and_then(as_f64);
    let vel_mps = state.get(9).and_then(as_f64);
    let track = state.get(10).and_then(as_f64);
    let vrate_mps = state.get(11).and_then(as_f64);

    Some(SourceRecord {
        icao,
        callsign,
        type_code: None,
        operator: None,
        lat,
        lon,
        altitude_ft: alt_m.map(|m| meters_to_feet(m).round() as i32),
        ground_speed_kts: vel_mps.map(mps_to_knots),
        track_deg: track,
        vertical_rate_fpm: vrate_mps.map(|v| mps_to_fpm(v).round() as i32),
        mil_flag: false,
        seen_sec: last_contact.map(|lc| (now - lc).max(0.0)),
        seen_pos_sec: last_contact.map(|lc| (now - lc).max(0.0)),
        source_name: "opensky".to_string(),
        last_position: None,
    })
}

pub struct OpenSkyClient {
    client: reqwest::Client,
    base_url: String,
    basic_auth: Option<(String, String)>,
}

impl OpenSkyClient {
    pub fn new(base_url: String, user: Option<String>, pass: Option<String>) -> Self {
        let basic_auth = user.zip(pass);
        OpenSkyClient { client: reqwest::Client::new(), base_url, basic_auth }
    }

    pub async fn fetch_states(&self, bbox: (f64, f64, f64, f64), now: f64) -> Result<Vec<SourceRecord>, FetchError> {
        let (lamin, lomin, lamax, lomax) = bbox;
        let url = format!("{}/states/all", self.base_url);
        let mut req = self
            .client
            .get(&url)
            .query(&[("lamin", lamin), ("lomin", lomin), ("lamax", lamax), ("lomax", lomax)])
            .timeout(std::time::Duration::from_secs(15));
        if let Some((user, pass)) = &self.basic_auth {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().await.map_err(|e| FetchError::TransientUpstream { source: e, attempt: 1 })?;
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited { retry_after: 60.0 });
        }
        let body: StatesResponse = resp.json().await.map_err(|e| FetchError::BadPayload(e.to_string()))?;
        let states = body.states.unwrap_or_default();
        Ok(states.iter().filter_map(|s| to_record(s, now)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_state_vector() {
        let state: Vec<Value> = vec![
            json!("adf7c8"),
            json!("REACH42 "),
            json!("United States"),
            json!(1700000000),
            json!(1700000000),
            json!(-82.0),
            json!(35.0),
            json!(7620.0),
            json!(false),
            json!(200.0),
            json!(90.0),
            json!(0.0),
        ];
        let record = to_record(&state, 1700000010.0).unwrap();
        assert_eq!(record.icao, [0xAD, 0xF7, 0xC8]);
        assert_eq!(record.callsign, Some("REACH42".to_string()));
        assert!((record.altitude_ft.unwrap() as f64 - 25000.0).abs() < 50.0);
        assert_eq!(record.seen_sec, Some(10.0));
    }

    #[test]
    fn test_missing_icao_returns_none() {
        let state: Vec<Value> = vec![json!(null)];
        assert!(to_record(&state, 0.0).is_none());
    }
}
