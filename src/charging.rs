//! Charging station corridor search and the OpenChargeMap locator.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::model::{ChargingStation, Connection, Location};
use crate::traits::{ChargingStationLocator, Deadline};

/// Default corridor radius around each waypoint.
pub const DEFAULT_CORRIDOR_KM: f64 = 2.0;

/// Appends stations whose id has not been seen yet, keeping first-seen order.
pub fn merge_stations(
    merged: &mut Vec<ChargingStation>,
    seen: &mut HashSet<i64>,
    found: impl IntoIterator<Item = ChargingStation>,
) {
    for station in found {
        if seen.insert(station.id) {
            merged.push(station);
        }
    }
}

/// Searches around every waypoint and returns stations deduplicated by id.
///
/// A failed waypoint lookup is skipped; the search itself never fails.
pub fn find_stations_along(
    locator: &dyn ChargingStationLocator,
    waypoints: &[Location],
    radius_km: f64,
    deadline: Deadline,
) -> Vec<ChargingStation> {
    let mut stations = Vec::new();
    let mut seen = HashSet::new();

    for waypoint in waypoints {
        match locator.find_near(waypoint.latitude, waypoint.longitude, radius_km, deadline) {
            Ok(found) => {
                debug!(waypoint = %waypoint, count = found.len(), "charging stations found");
                merge_stations(&mut stations, &mut seen, found);
            }
            Err(err) => {
                warn!(waypoint = %waypoint, error = %err, "skipping charging station lookup");
            }
        }
    }

    stations
}

/// Locator used when no charging API is configured; always finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChargingStations;

impl ChargingStationLocator for NoChargingStations {
    fn find_near(
        &self,
        _lat: f64,
        _lng: f64,
        _radius_km: f64,
        _deadline: Deadline,
    ) -> Result<Vec<ChargingStation>, ProviderError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct OpenChargeMapConfig {
    pub base_url: String,
    pub api_key: String,
    pub max_results: u32,
    pub timeout_secs: u64,
}

impl Default for OpenChargeMapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openchargemap.io/v3/poi".to_string(),
            api_key: String::new(),
            max_results: 10,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenChargeMapClient {
    config: OpenChargeMapConfig,
    client: reqwest::blocking::Client,
}

impl OpenChargeMapClient {
    pub fn new(config: OpenChargeMapConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl ChargingStationLocator for OpenChargeMapClient {
    fn find_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        deadline: Deadline,
    ) -> Result<Vec<ChargingStation>, ProviderError> {
        let timeout = deadline
            .timeout_capped(Duration::from_secs(self.config.timeout_secs))
            .ok_or(ProviderError::DeadlineExceeded)?;

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("output", "json".to_string()),
                ("latitude", format!("{:.6}", lat)),
                ("longitude", format!("{:.6}", lng)),
                ("distance", format!("{}", radius_km)),
                ("distanceunit", "km".to_string()),
                ("maxresults", self.config.max_results.to_string()),
            ])
            .header("X-API-Key", &self.config.api_key)
            .timeout(timeout)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.to_string()));
        }

        let body = response.json::<Vec<OcmPoi>>()?;
        Ok(body.into_iter().map(ChargingStation::from).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcmPoi {
    #[serde(rename = "ID")]
    id: i64,
    address_info: OcmAddressInfo,
    #[serde(default)]
    connections: Vec<OcmConnection>,
    usage_type: Option<OcmTitled>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcmAddressInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    address_line1: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcmConnection {
    connection_type: Option<OcmTitled>,
    #[serde(rename = "PowerKW")]
    power_kw: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcmTitled {
    #[serde(default)]
    title: String,
}

impl From<OcmPoi> for ChargingStation {
    fn from(poi: OcmPoi) -> Self {
        Self {
            id: poi.id,
            name: poi.address_info.title,
            address: poi.address_info.address_line1.unwrap_or_default(),
            latitude: poi.address_info.latitude,
            longitude: poi.address_info.longitude,
            connections: poi
                .connections
                .into_iter()
                .map(|c| Connection {
                    connection_type: c.connection_type.map(|t| t.title).unwrap_or_default(),
                    power_kw: c.power_kw,
                })
                .collect(),
            usage_type: poi.usage_type.map(|t| t.title).unwrap_or_default(),
        }
    }
}
