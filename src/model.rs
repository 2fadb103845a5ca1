//! Domain data model shared by the engine, its collaborators and the HTTP layer.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A geographic point (WGS-84 degrees) with an optional street address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// (lat, lng) pair.
    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Means of travel for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Car,
    Bicycle,
    Walking,
    PublicTransit,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Car,
        TransportMode::Bicycle,
        TransportMode::Walking,
        TransportMode::PublicTransit,
    ];

    /// Wire/storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Bicycle => "bicycle",
            TransportMode::Walking => "walking",
            TransportMode::PublicTransit => "public_transit",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance/duration pair reported by a directions provider for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub distance_m: f64,
    pub duration: Duration,
}

/// One mode's route between the request's origin and destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub start_location: Location,
    pub end_location: Location,
    pub mode: TransportMode,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Meters.
    pub distance: f64,
    /// Grams of CO2.
    pub co2_emission: f64,
}

/// A computed multi-modal route.
///
/// Totals are derived from the segments at construction and cannot be set
/// independently; a route always holds at least one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: Option<i64>,
    pub user_id: String,
    pub start_location: Location,
    pub end_location: Location,
    segments: Vec<RouteSegment>,
    total_distance: f64,
    #[serde(serialize_with = "serialize_secs")]
    total_duration: Duration,
    total_emission: f64,
    pub created_at: DateTime<Utc>,
}

impl Route {
    /// Builds a route from its segments. Returns `None` when `segments` is empty.
    pub fn new(
        user_id: impl Into<String>,
        start_location: Location,
        end_location: Location,
        segments: Vec<RouteSegment>,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }

        let total_distance = segments.iter().map(|s| s.distance).sum();
        let total_duration = segments.iter().map(|s| s.duration).sum();
        let total_emission = segments.iter().map(|s| s.co2_emission).sum();

        Some(Self {
            id: None,
            user_id: user_id.into(),
            start_location,
            end_location,
            segments,
            total_distance,
            total_duration,
            total_emission,
            created_at,
        })
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    /// Mode of the first computed segment (evaluation order).
    pub fn primary_mode(&self) -> TransportMode {
        self.segments[0].mode
    }

    pub fn primary_segment(&self) -> &RouteSegment {
        &self.segments[0]
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn total_emission(&self) -> f64 {
        self.total_emission
    }
}

/// Caller preferences for route calculation.
///
/// Only `preferred_modes` drives the engine today; the remaining fields are
/// accepted and carried but not enforced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePreferences {
    pub preferred_modes: Vec<TransportMode>,
    pub avoid_highways: bool,
    /// Meters.
    pub max_walking_distance: f64,
    pub prioritize_emission: bool,
    pub max_transfers: u32,
}

impl RoutePreferences {
    pub fn with_modes(modes: impl IntoIterator<Item = TransportMode>) -> Self {
        Self {
            preferred_modes: modes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Preferred modes in evaluation order, repeated entries dropped.
    pub fn evaluation_order(&self) -> Vec<TransportMode> {
        let mut modes = Vec::with_capacity(self.preferred_modes.len());
        for mode in &self.preferred_modes {
            if !modes.contains(mode) {
                modes.push(*mode);
            }
        }
        modes
    }
}

/// Lookup key for historical traffic: route endpoints plus a time-of-week bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficKey {
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    /// 0..=23.
    pub hour_of_day: u8,
}

impl TrafficKey {
    pub fn new(start: &Location, end: &Location, day_of_week: u8, hour_of_day: u8) -> Self {
        Self {
            start_lat: start.latitude,
            start_lng: start.longitude,
            end_lat: end.latitude,
            end_lng: end.longitude,
            day_of_week,
            hour_of_day,
        }
    }

    /// Key for the bucket containing `at`.
    pub fn at(start: &Location, end: &Location, at: DateTime<Local>) -> Self {
        Self::new(
            start,
            end,
            at.weekday().num_days_from_sunday() as u8,
            at.hour() as u8,
        )
    }
}

/// Aggregated travel duration observations for one traffic key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficPattern {
    pub key: TrafficKey,
    /// Running mean over `sample_count` observations, in seconds.
    pub average_duration_secs: f64,
    pub sample_count: u32,
    pub last_updated: DateTime<Utc>,
}

impl TrafficPattern {
    pub fn average_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.average_duration_secs).unwrap_or_default()
    }
}

/// A single plug type offered by a charging station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_type: String,
    pub power_kw: Option<f64>,
}

/// EV charging station. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingStation {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub connections: Vec<Connection>,
    pub usage_type: String,
}

/// The engine's output: a persisted route plus stations near its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWithCharging {
    pub route: Route,
    pub charging_stations: Vec<ChargingStation>,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
