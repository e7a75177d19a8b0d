//! I/O-shaped settings (§9): credentials and endpoints are environment-
//! loaded once at startup via `clap`'s `env` feature, layered over an
//! optional `~/.skyfusion/config.yaml` for non-secret defaults (dashboard
//! host/port, tick intervals).

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection string.
    #[arg(long, env = "SKYFUSION_DATABASE_URL")]
    pub database_url: String,

    /// Bulk military-feed base URL (`{ac: [...]}` shape).
    #[arg(long, env = "SKYFUSION_MILITARY_FEED_URL")]
    pub military_feed_url: Option<String>,

    /// Bearer token for the military feed, if required.
    #[arg(long, env = "SKYFUSION_MILITARY_FEED_TOKEN")]
    pub military_feed_token: Option<String>,

    /// OpenSky-style `/states/all` base URL.
    #[arg(long, env = "SKYFUSION_OPENSKY_URL")]
    pub opensky_url: Option<String>,

    #[arg(long, env = "SKYFUSION_OPENSKY_USER")]
    pub opensky_user: Option<String>,

    #[arg(long, env = "SKYFUSION_OPENSKY_PASS")]
    pub opensky_pass: Option<String>,

    /// News article-list endpoint.
    #[arg(long, env = "SKYFUSION_NEWS_URL")]
    pub news_url: Option<String>,

    #[arg(long, env = "SKYFUSION_NEWS_API_KEY")]
    pub news_api_key: Option<String>,

    /// Generative-model / embedding provider; disabled when absent.
    #[arg(long, env = "SKYFUSION_LLM_URL")]
    pub llm_url: Option<String>,

    #[arg(long, env = "SKYFUSION_LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Outbound webhook for alert notifications.
    #[arg(long, env = "SKYFUSION_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    #[arg(long, env = "SKYFUSION_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SKYFUSION_PORT", default_value = "8080")]
    pub port: u16,

    /// Non-secret defaults file (tick intervals, region bounding boxes).
    #[arg(long, env = "SKYFUSION_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// Non-secret defaults, loaded from `config_file` if given, else the
/// shape's own `Default`. Parsed with a hand-rolled minimal `key: value`
/// reader rather than a full YAML dependency.
#[derive(Debug, Clone)]
pub struct FileDefaults {
    pub region_bbox: (f64, f64, f64, f64),
    pub aggregator_tick_sec: u64,
    pub proximity_scan_sec: u64,
    pub formation_scan_sec: u64,
    pub geofence_eval_sec: u64,
    pub trajectory_predict_sec: u64,
    pub trajectory_validate_sec: u64,
    pub activity_zone_refresh_sec: u64,
    pub calibration_retrain_sec: u64,
    pub threshold_decay_sec: u64,
}

fn default_bbox() -> (f64, f64, f64, f64) {
    (-90.0, -180.0, 90.0, 180.0)
}
fn default_tick_sec() -> u64 {
    30
}
fn default_proximity_sec() -> u64 {
    30
}
fn default_formation_sec() -> u64 {
    30
}
fn default_geofence_eval_sec() -> u64 {
    15
}
fn default_trajectory_sec() -> u64 {
    60
}
fn default_trajectory_validate_sec() -> u64 {
    300
}
fn default_activity_refresh_sec() -> u64 {
    600
}
fn default_calibration_sec() -> u64 {
    86_400
}
fn default_threshold_sec() -> u64 {
    3_600
}

impl Default for FileDefaults {
    fn default() -> Self {
        FileDefaults {
            region_bbox: default_bbox(),
            aggregator_tick_sec: default_tick_sec(),
            proximity_scan_sec: default_proximity_sec(),
            formation_scan_sec: default_formation_sec(),
            geofence_eval_sec: default_geofence_eval_sec(),
            trajectory_predict_sec: default_trajectory_sec(),
            trajectory_validate_sec: default_trajectory_validate_sec(),
            activity_zone_refresh_sec: default_activity_refresh_sec(),
            calibration_retrain_sec: default_calibration_sec(),
            threshold_decay_sec: default_threshold_sec(),
        }
    }
}

impl FileDefaults {
    pub fn load(path: Option<&PathBuf>) -> Self {
        let Some(path) = path else {
            return FileDefaults::default();
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_yaml_like::parse(&contents).unwrap_or_default(),
            Err(_) => FileDefaults::default(),
        }
    }
}

/// Minimal `key: value` line parser, deliberately not a full YAML
/// implementation. Only scalar top-level keys are recognized; unknown
/// keys are ignored.
mod serde_yaml_like {
    use super::FileDefaults;

    pub fn parse(contents: &str) -> Option<FileDefaults> {
        let mut d = FileDefaults::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            let value = value.trim();
            match key {
                "aggregator_tick_sec" => d.aggregator_tick_sec = value.parse().ok()?,
                "proximity_scan_sec" => d.proximity_scan_sec = value.parse().ok()?,
                "formation_scan_sec" => d.formation_scan_sec = value.parse().ok()?,
                "geofence_eval_sec" => d.geofence_eval_sec = value.parse().ok()?,
                "trajectory_predict_sec" => d.trajectory_predict_sec = value.parse().ok()?,
                "trajectory_validate_sec" => d.trajectory_validate_sec = value.parse().ok()?,
                "activity_zone_refresh_sec" => d.activity_zone_refresh_sec = value.parse().ok()?,
                "calibration_retrain_sec" => d.calibration_retrain_sec = value.parse().ok()?,
                "threshold_decay_sec" => d.threshold_decay_sec = value.parse().ok()?,
                _ => {}
            }
        }
        Some(d)
    }
}
