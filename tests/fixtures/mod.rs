//! Test fixtures for greenroute.
//!
//! Provides:
//! - Real German city coordinates
//! - Fake collaborators that record their calls and fail on demand

#![allow(dead_code)]

pub mod german_cities;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use greenroute::engine::{EngineOptions, RouteEngine};
use greenroute::error::{ProviderError, StoreError};
use greenroute::model::{ChargingStation, Leg, Location, Route, TrafficKey, TrafficPattern, TransportMode};
use greenroute::traits::{ChargingStationLocator, Deadline, DirectionsProvider, RouteStore, TrafficHistoryStore};

pub use german_cities::*;

// ============================================================================
// Directions
// ============================================================================

/// Directions provider answering from a fixed table; unknown modes are `NotFound`.
#[derive(Default)]
pub struct FakeDirections {
    legs: HashMap<TransportMode, Leg>,
    delays: HashMap<TransportMode, Duration>,
    pub calls: Mutex<Vec<TransportMode>>,
}

impl FakeDirections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leg(mut self, mode: TransportMode, distance_m: f64, duration_secs: u64) -> Self {
        self.legs.insert(
            mode,
            Leg {
                distance_m,
                duration: Duration::from_secs(duration_secs),
            },
        );
        self
    }

    /// Makes the answer for `mode` arrive late.
    pub fn delay(mut self, mode: TransportMode, delay: Duration) -> Self {
        self.delays.insert(mode, delay);
        self
    }

    pub fn calls(&self) -> Vec<TransportMode> {
        self.calls.lock().unwrap().clone()
    }
}

impl DirectionsProvider for FakeDirections {
    fn route(
        &self,
        _origin: &Location,
        _destination: &Location,
        mode: TransportMode,
        _deadline: Deadline,
    ) -> Result<Leg, ProviderError> {
        self.calls.lock().unwrap().push(mode);
        if let Some(delay) = self.delays.get(&mode) {
            thread::sleep(*delay);
        }
        self.legs.get(&mode).copied().ok_or(ProviderError::NotFound)
    }
}

// ============================================================================
// Traffic history
// ============================================================================

#[derive(Default)]
pub struct FakeTraffic {
    average_secs: Option<f64>,
    fail_get: bool,
    fail_upsert: bool,
    pub gets: Mutex<Vec<TrafficKey>>,
    pub upserts: Mutex<Vec<(TrafficKey, Duration)>>,
}

impl FakeTraffic {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_average(secs: f64) -> Self {
        Self {
            average_secs: Some(secs),
            ..Self::default()
        }
    }

    pub fn failing_get() -> Self {
        Self {
            fail_get: true,
            ..Self::default()
        }
    }

    pub fn failing_upsert() -> Self {
        Self {
            fail_upsert: true,
            ..Self::default()
        }
    }

    pub fn gets(&self) -> Vec<TrafficKey> {
        self.gets.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<(TrafficKey, Duration)> {
        self.upserts.lock().unwrap().clone()
    }
}

impl TrafficHistoryStore for FakeTraffic {
    fn get(&self, key: &TrafficKey, deadline: Deadline) -> Result<Option<TrafficPattern>, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        self.gets.lock().unwrap().push(*key);
        if self.fail_get {
            return Err(StoreError::Poisoned);
        }
        Ok(self.average_secs.map(|average| TrafficPattern {
            key: *key,
            average_duration_secs: average,
            sample_count: 4,
            last_updated: chrono::Utc::now(),
        }))
    }

    fn upsert(&self, key: &TrafficKey, observed: Duration, _deadline: Deadline) -> Result<(), StoreError> {
        self.upserts.lock().unwrap().push((*key, observed));
        if self.fail_upsert {
            return Err(StoreError::Poisoned);
        }
        Ok(())
    }
}

// ============================================================================
// Route store
// ============================================================================

#[derive(Default)]
pub struct FakeRouteStore {
    fail: bool,
    pub saved: Mutex<Vec<Route>>,
}

impl FakeRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<Route> {
        self.saved.lock().unwrap().clone()
    }
}

impl RouteStore for FakeRouteStore {
    fn save(&self, route: &Route, _deadline: Deadline) -> Result<i64, StoreError> {
        if self.fail {
            return Err(StoreError::Poisoned);
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(route.clone());
        Ok(saved.len() as i64)
    }
}

// ============================================================================
// Charging stations
// ============================================================================

/// Locator answering per waypoint latitude; unknown waypoints find nothing.
#[derive(Default)]
pub struct FakeLocator {
    stations: Vec<(f64, Vec<ChargingStation>)>,
    failing: Vec<f64>,
    pub calls: Mutex<Vec<(f64, f64, f64)>>,
}

impl FakeLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn near(mut self, waypoint: &Location, ids: &[i64]) -> Self {
        let stations = ids.iter().map(|id| station(*id, waypoint)).collect();
        self.stations.push((waypoint.latitude, stations));
        self
    }

    pub fn failing_at(mut self, waypoint: &Location) -> Self {
        self.failing.push(waypoint.latitude);
        self
    }

    pub fn calls(&self) -> Vec<(f64, f64, f64)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChargingStationLocator for FakeLocator {
    fn find_near(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        _deadline: Deadline,
    ) -> Result<Vec<ChargingStation>, ProviderError> {
        self.calls.lock().unwrap().push((lat, lng, radius_km));
        if self.failing.contains(&lat) {
            return Err(ProviderError::Status("503 Service Unavailable".to_string()));
        }
        Ok(self
            .stations
            .iter()
            .filter(|(at, _)| *at == lat)
            .flat_map(|(_, found)| found.clone())
            .collect())
    }
}

pub fn station(id: i64, near: &Location) -> ChargingStation {
    ChargingStation {
        id,
        name: format!("Station {}", id),
        address: format!("{} Teststrasse", id),
        latitude: near.latitude + 0.001,
        longitude: near.longitude - 0.001,
        connections: Vec::new(),
        usage_type: "Public".to_string(),
    }
}

// ============================================================================
// Engine wiring
// ============================================================================

/// Handles to every fake so tests can inspect calls after running the engine.
pub struct Harness {
    pub directions: Arc<FakeDirections>,
    pub traffic: Arc<FakeTraffic>,
    pub routes: Arc<FakeRouteStore>,
    pub locator: Arc<FakeLocator>,
    pub engine: RouteEngine,
}

impl Harness {
    pub fn new(
        directions: FakeDirections,
        traffic: FakeTraffic,
        routes: FakeRouteStore,
        locator: FakeLocator,
    ) -> Self {
        let directions = Arc::new(directions);
        let traffic = Arc::new(traffic);
        let routes = Arc::new(routes);
        let locator = Arc::new(locator);
        let engine = RouteEngine::new(
            Box::new(directions.clone()),
            Box::new(traffic.clone()),
            Box::new(routes.clone()),
            Box::new(locator.clone()),
            EngineOptions::default(),
        );
        Self {
            directions,
            traffic,
            routes,
            locator,
            engine,
        }
    }

    /// Everything healthy, no history, no stations.
    pub fn with_directions(directions: FakeDirections) -> Self {
        Self::new(directions, FakeTraffic::empty(), FakeRouteStore::new(), FakeLocator::new())
    }
}
