//! Capability traits for the route engine's collaborators.
//!
//! The engine only talks to these interfaces. Concrete clients (OSRM,
//! OpenChargeMap, SQLite) are built once at startup and injected; tests
//! supply their own fakes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ProviderError, StoreError};
use crate::model::{ChargingStation, Leg, Location, Route, TrafficKey, TrafficPattern, TransportMode};

/// Point in time by which a request and all of its sub-calls must finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// Time left, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }

    /// The earlier of this deadline and `now + timeout`.
    pub fn tightened(self, timeout: Duration) -> Self {
        self.min(Self::after(timeout))
    }

    /// Timeout to hand to an I/O call capped at `cap`.
    pub fn timeout_capped(&self, cap: Duration) -> Option<Duration> {
        self.remaining().map(|left| left.min(cap))
    }
}

/// Per-mode route lookup between two points.
pub trait DirectionsProvider: Send + Sync {
    fn route(
        &self,
        origin: &Location,
        destination: &Location,
        mode: TransportMode,
        deadline: Deadline,
    ) -> Result<Leg, ProviderError>;
}

/// Historical travel durations keyed by endpoints and time-of-week.
///
/// Shared across concurrent requests; `upsert` must be atomic in the backend.
pub trait TrafficHistoryStore: Send + Sync {
    /// `Ok(None)` means no observations for this key.
    fn get(&self, key: &TrafficKey, deadline: Deadline) -> Result<Option<TrafficPattern>, StoreError>;

    /// Adds one observation: increments the sample count and accumulates the duration.
    fn upsert(&self, key: &TrafficKey, observed: Duration, deadline: Deadline) -> Result<(), StoreError>;
}

/// Persisted route history.
pub trait RouteStore: Send + Sync {
    /// Saves the route and returns its assigned id.
    fn save(&self, route: &Route, deadline: Deadline) -> Result<i64, StoreError>;
}

/// Proximity search for EV charging stations.
pub trait ChargingStationLocator: Send + Sync {
    fn find_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        deadline: Deadline,
    ) -> Result<Vec<ChargingStation>, ProviderError>;
}

impl<T: DirectionsProvider + ?Sized> DirectionsProvider for Arc<T> {
    fn route(
        &self,
        origin: &Location,
        destination: &Location,
        mode: TransportMode,
        deadline: Deadline,
    ) -> Result<Leg, ProviderError> {
        (**self).route(origin, destination, mode, deadline)
    }
}

impl<T: TrafficHistoryStore + ?Sized> TrafficHistoryStore for Arc<T> {
    fn get(&self, key: &TrafficKey, deadline: Deadline) -> Result<Option<TrafficPattern>, StoreError> {
        (**self).get(key, deadline)
    }

    fn upsert(&self, key: &TrafficKey, observed: Duration, deadline: Deadline) -> Result<(), StoreError> {
        (**self).upsert(key, observed, deadline)
    }
}

impl<T: RouteStore + ?Sized> RouteStore for Arc<T> {
    fn save(&self, route: &Route, deadline: Deadline) -> Result<i64, StoreError> {
        (**self).save(route, deadline)
    }
}

impl<T: ChargingStationLocator + ?Sized> ChargingStationLocator for Arc<T> {
    fn find_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        deadline: Deadline,
    ) -> Result<Vec<ChargingStation>, ProviderError> {
        (**self).find_near(lat, lng, radius_km, deadline)
    }
}
