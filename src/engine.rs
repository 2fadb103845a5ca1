//! Route aggregation engine.
//!
//! Fans a request out across the preferred transport modes, merges the
//! successful ones into a single route, applies historical traffic, persists
//! the result and decorates it with charging stations near the endpoints.
//!
//! Sub-call failures are handled per branch:
//! - directions (per mode): skipped, the request fails only if no mode succeeds
//! - traffic lookup: "no data" continues, any other failure is fatal
//! - route save: fatal
//! - traffic upsert: logged and ignored
//! - charging search (per waypoint): logged and skipped

use std::time::Duration;

use chrono::{Local, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::charging::{find_stations_along, DEFAULT_CORRIDOR_KM};
use crate::emission;
use crate::error::{ProviderError, RouteError, RouteResult};
use crate::geo;
use crate::model::{
    Location, Route, RoutePreferences, RouteSegment, RouteWithCharging, TrafficKey, TrafficPattern,
    TransportMode,
};
use crate::traits::{ChargingStationLocator, Deadline, DirectionsProvider, RouteStore, TrafficHistoryStore};

/// Upper bound on the historical traffic lookup.
pub const TRAFFIC_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Radius searched around each waypoint for charging stations.
    pub corridor_radius_km: f64,
    /// Overall budget for one `calculate_route` call.
    pub request_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            corridor_radius_km: DEFAULT_CORRIDOR_KM,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of asking the directions provider for one mode.
#[derive(Debug)]
enum ModeOutcome {
    Computed(RouteSegment),
    Skipped(TransportMode, ProviderError),
}

pub struct RouteEngine {
    directions: Box<dyn DirectionsProvider>,
    traffic: Box<dyn TrafficHistoryStore>,
    routes: Box<dyn RouteStore>,
    charging: Box<dyn ChargingStationLocator>,
    options: EngineOptions,
}

impl RouteEngine {
    pub fn new(
        directions: Box<dyn DirectionsProvider>,
        traffic: Box<dyn TrafficHistoryStore>,
        routes: Box<dyn RouteStore>,
        charging: Box<dyn ChargingStationLocator>,
        options: EngineOptions,
    ) -> Self {
        Self {
            directions,
            traffic,
            routes,
            charging,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Computes, persists and decorates a route using the configured request timeout.
    pub fn calculate_route(
        &self,
        start: Location,
        end: Location,
        prefs: &RoutePreferences,
        user_id: &str,
    ) -> RouteResult<RouteWithCharging> {
        let deadline = Deadline::after(self.options.request_timeout);
        self.calculate_route_within(start, end, prefs, user_id, deadline)
    }

    /// Same as [`calculate_route`](Self::calculate_route) under a caller-supplied deadline.
    /// Every sub-call is bounded by it.
    pub fn calculate_route_within(
        &self,
        start: Location,
        end: Location,
        prefs: &RoutePreferences,
        user_id: &str,
        deadline: Deadline,
    ) -> RouteResult<RouteWithCharging> {
        geo::validate(&start, &end)?;

        let key = TrafficKey::at(&start, &end, Local::now());
        let pattern = self
            .traffic
            .get(&key, deadline.tightened(TRAFFIC_LOOKUP_TIMEOUT))?;
        if let Some(pattern) = &pattern {
            debug!(
                samples = pattern.sample_count,
                average_secs = pattern.average_duration_secs,
                "historical traffic available"
            );
        }

        let segments = self.compute_segments(&start, &end, prefs, pattern.as_ref(), deadline);
        let mut route = Route::new(user_id, start.clone(), end.clone(), segments, Utc::now())
            .ok_or(RouteError::NoRouteFound)?;

        // must succeed
        let id = self.routes.save(&route, deadline)?;
        route.id = Some(id);
        info!(
            route_id = id,
            primary_mode = %route.primary_mode(),
            segments = route.segments().len(),
            distance_m = route.total_distance(),
            co2_g = route.total_emission(),
            "route computed"
        );

        // best effort
        let observed = route.primary_segment().duration;
        if let Err(err) = self.traffic.upsert(&key, observed, deadline) {
            warn!(error = %err, "failed to record traffic observation");
        }

        // best effort, only the endpoints are searched
        let waypoints = [start, end];
        let charging_stations = find_stations_along(
            self.charging.as_ref(),
            &waypoints,
            self.options.corridor_radius_km,
            deadline,
        );

        Ok(RouteWithCharging {
            route,
            charging_stations,
        })
    }

    /// One segment per mode that the provider could route, in preference order.
    fn compute_segments(
        &self,
        start: &Location,
        end: &Location,
        prefs: &RoutePreferences,
        pattern: Option<&TrafficPattern>,
        deadline: Deadline,
    ) -> Vec<RouteSegment> {
        let modes = prefs.evaluation_order();
        if modes.is_empty() {
            return Vec::new();
        }

        // Directions calls block on I/O, so each request gets its own pool
        // with one worker per mode instead of sharing the global pool.
        let compute = |mode| self.compute_segment(start, end, mode, deadline);
        let outcomes: Vec<ModeOutcome> = match rayon::ThreadPoolBuilder::new()
            .num_threads(modes.len())
            .thread_name(|i| format!("route-mode-{}", i))
            .build()
        {
            Ok(pool) => pool.install(|| modes.into_par_iter().map(compute).collect()),
            Err(err) => {
                warn!(error = %err, "mode pool unavailable, evaluating sequentially");
                modes.into_iter().map(compute).collect()
            }
        };

        let mut segments = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                ModeOutcome::Computed(mut segment) => {
                    if let Some(pattern) = pattern {
                        segment.duration = pattern.average_duration();
                    }
                    segments.push(segment);
                }
                ModeOutcome::Skipped(mode, err) => {
                    warn!(mode = %mode, error = %err, "skipping transport mode");
                }
            }
        }
        segments
    }

    fn compute_segment(
        &self,
        start: &Location,
        end: &Location,
        mode: TransportMode,
        deadline: Deadline,
    ) -> ModeOutcome {
        if deadline.is_expired() {
            return ModeOutcome::Skipped(mode, ProviderError::DeadlineExceeded);
        }

        debug!(mode = %mode, "requesting directions");
        match self.directions.route(start, end, mode, deadline) {
            Ok(leg) => ModeOutcome::Computed(RouteSegment {
                start_location: start.clone(),
                end_location: end.clone(),
                mode,
                duration: leg.duration,
                distance: leg.distance_m,
                co2_emission: emission::estimate(mode, leg.distance_m),
            }),
            Err(err) => ModeOutcome::Skipped(mode, err),
        }
    }
}
