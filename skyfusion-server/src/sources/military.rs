//! Bulk/point-radius/by-hex military feed client (§6): `{ac: [...]}` with
//! the common record shape `{hex, flight?, r?, t?, desc?, lat?, lon?,
//! alt_baro?, alt_geom?, gs?, track?, baro_rate?, squawk?, seen?,
//! seen_pos?, category?, ownOp?, mil?}`.

use serde::Deserialize;

use skyfusion_core::aggregator::SourceRecord;
use skyfusion_core::types::Icao;

use crate::errors::FetchError;

#[derive(Debug, Deserialize)]
struct MilitaryResponse {
    ac: Vec<MilitaryAircraft>,
}

#[derive(Debug, Deserialize)]
struct MilitaryAircraft {
    hex: String,
    flight: Option<String>,
    r: Option<String>,
    t: Option<String>,
    #[allow(dead_code)]
    desc: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    alt_baro: Option<AltBaro>,
    #[allow(dead_code)]
    alt_geom: Option<f64>,
    gs: Option<f64>,
    track: Option<f64>,
    baro_rate: Option<f64>,
    seen: Option<f64>,
    seen_pos: Option<f64>,
    #[serde(rename = "ownOp")]
    own_op: Option<String>,
    mil: Option<bool>,
}

/// `alt_baro` is usually a number but upstream sometimes reports the
/// literal string `"ground"` — decode as an enum rather than panicking.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AltBaro {
    Feet(f64),
    Ground(String),
}

fn parse_hex(hex: &str) -> Option<Icao> {
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

fn to_record(a: MilitaryAircraft, source_name: &str) -> Option<SourceRecord> {
    let icao = parse_hex(&a.hex)?;
    let altitude_ft = match a.alt_baro {
        Some(AltBaro::Feet(ft)) => Some(ft.round() as i32),
        Some(AltBaro::Ground(_)) => Some(0),
        None => None,
    };

    Some(SourceRecord {
        icao,
        callsign: a.flight.map(|s| s.trim().to_string()),
        type_code: a.t,
        operator: a.own_op.or(a.r),
        lat: a.lat,
        lon: a.lon,
        altitude_ft,
        ground_speed_kts: a.gs,
        track_deg: a.track,
        vertical_rate_fpm: a.baro_rate.map(|v| v.round() as i32),
        mil_flag: a.mil.unwrap_or(false),
        seen_sec: a.seen,
        seen_pos_sec: a.seen_pos,
        source_name: source_name.to_string(),
        last_position: None,
    })
}

pub struct MilitaryFeedClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl MilitaryFeedClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        MilitaryFeedClient { client: reqwest::Client::new(), base_url, token }
    }

    async fn get(&self, path: &str) -> Result<MilitaryResponse, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.get(&url).timeout(std::time::Duration::from_secs(10));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| FetchError::TransientUpstream { source: e, attempt: 1 })?;
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited { retry_after: 30.0 });
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(MilitaryResponse { ac: Vec::new() });
        }
        resp.json().await.map_err(|e| FetchError::BadPayload(e.to_string()))
    }

    /// Bulk military feed: all currently broadcasting military aircraft.
    pub async fn fetch_bulk(&self) -> Result<Vec<SourceRecord>, FetchError> {
        let body = self.get("/mil").await?;
        Ok(body.ac.into_iter().filter_map(|a| to_record(a, "military_bulk")).collect())
    }

    /// Point-radius query, e.g. around a geofence or region of interest.
    pub async fn fetch_point_radius(&self, lat: f64, lon: f64, radius_nm: f64) -> Result<Vec<SourceRecord>, FetchError> {
        let path = format!("/point/{lat}/{lon}/{radius_nm}");
        let body = self.get(&path).await?;
        Ok(body.ac.into_iter().filter_map(|a| to_record(a, "military_point_radius")).collect())
    }

    /// By-hex lookup; 404 is treated as "not currently airborne", not an
    /// error.
    pub async fn fetch_by_hex(&self, hex: &str) -> Result<Option<SourceRecord>, FetchError> {
        let path = format!("/hex/{hex}");
        let body = self.get(&path).await?;
        Ok(body.ac.into_iter().next().and_then(|a| to_record(a, "military_by_hex")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_rejects_wrong_length() {
        assert!(parse_hex("ADF7C").is_none());
        assert_eq!(parse_hex("ADF7C8"), Some([0xAD, 0xF7, 0xC8]));
    }

    #[test]
    fn test_to_record_maps_ground_altitude_to_zero() {
        let ac = MilitaryAircraft {
            hex: "adf7c8".into(),
            flight: Some("REACH42".into()),
            r: None,
            t: Some("K35R".into()),
            desc: None,
            lat: Some(35.0),
            lon: Some(-82.0),
            alt_baro: Some(AltBaro::Ground("ground".into())),
            alt_geom: None,
            gs: Some(0.0),
            track: None,
            baro_rate: None,
            seen: Some(1.0),
            seen_pos: Some(1.0),
            own_op: None,
            mil: Some(true),
        };
        let record = to_record(ac, "military_bulk").unwrap();
        assert_eq!(record.altitude_ft, Some(0));
        assert!(record.mil_flag);
    }
}
