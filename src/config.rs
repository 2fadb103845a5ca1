//! Application configuration from environment variables.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::charging::{OpenChargeMapConfig, DEFAULT_CORRIDOR_KM};
use crate::engine::EngineOptions;
use crate::osrm::OsrmConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the HTTP server listens on.
    pub bind: String,
    pub database_path: String,
    /// `None` routes with the haversine fallback.
    pub osrm: Option<OsrmConfig>,
    /// `None` disables the charging station search.
    pub charging: Option<OpenChargeMapConfig>,
    pub engine: EngineOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            database_path: "greenroute.db".to_string(),
            osrm: None,
            charging: None,
            engine: EngineOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut c = AppConfig::default();

        if let Some(v) = lookup("BIND") {
            c.bind = v;
        }
        if let Some(port) = lookup("PORT") {
            let host = c.bind.rsplit_once(':').map(|(host, _)| host).unwrap_or("0.0.0.0");
            c.bind = format!("{}:{}", host, port);
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            c.database_path = v;
        }

        if let Some(base_url) = lookup("OSRM_URL") {
            let mut osrm = OsrmConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                ..OsrmConfig::default()
            };
            osrm.timeout_secs = parse_or(&lookup, "OSRM_TIMEOUT_SECS", osrm.timeout_secs);
            c.osrm = Some(osrm);
        }

        if let Some(api_key) = lookup("OPENCHARGE_API_KEY").filter(|k| !k.is_empty()) {
            let mut charging = OpenChargeMapConfig {
                api_key,
                ..OpenChargeMapConfig::default()
            };
            if let Some(url) = lookup("OPENCHARGE_URL") {
                charging.base_url = url;
            }
            c.charging = Some(charging);
        }

        c.engine.corridor_radius_km = parse_or(&lookup, "CORRIDOR_RADIUS_KM", DEFAULT_CORRIDOR_KM);
        let timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", c.engine.request_timeout.as_secs());
        c.engine.request_timeout = Duration::from_secs(timeout_secs);

        c
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
    }
}
