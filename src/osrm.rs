//! OSRM HTTP adapter for per-mode directions.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::{Leg, Location, TransportMode};
use crate::traits::{Deadline, DirectionsProvider};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    /// OSRM profile per supported mode. Modes without a profile are not routed.
    pub profiles: BTreeMap<TransportMode, String>,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profiles: BTreeMap::from([
                (TransportMode::Car, "driving".to_string()),
                (TransportMode::Bicycle, "cycling".to_string()),
                (TransportMode::Walking, "foot".to_string()),
            ]),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, profile: &str, origin: &Location, destination: &Location) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false&alternatives=false",
            self.config.base_url,
            profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

impl DirectionsProvider for OsrmClient {
    fn route(
        &self,
        origin: &Location,
        destination: &Location,
        mode: TransportMode,
        deadline: Deadline,
    ) -> Result<Leg, ProviderError> {
        let profile = self
            .config
            .profiles
            .get(&mode)
            .ok_or(ProviderError::UnsupportedMode(mode))?;
        let timeout = deadline
            .timeout_capped(Duration::from_secs(self.config.timeout_secs))
            .ok_or(ProviderError::DeadlineExceeded)?;

        let body = self
            .client
            .get(self.route_url(profile, origin, destination))
            .timeout(timeout)
            .send()?
            .json::<OsrmRouteResponse>()?;

        body.into_leg()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

impl OsrmRouteResponse {
    fn into_leg(self) -> Result<Leg, ProviderError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => return Err(ProviderError::NotFound),
            other => return Err(ProviderError::Status(other.to_string())),
        }

        let route = self.routes.into_iter().next().ok_or(ProviderError::NotFound)?;
        Ok(Leg {
            distance_m: route.distance,
            duration: Duration::try_from_secs_f64(route.duration.round())
                .map_err(|_| ProviderError::Status(format!("invalid duration {}", route.duration)))?,
        })
    }
}
