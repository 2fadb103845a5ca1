//! Haversine directions provider (fallback when OSRM unavailable).
//!
//! Uses great-circle distance to estimate distance and travel time.
//! Less accurate than OSRM (ignores roads) but always available.

use std::time::Duration;

use crate::error::ProviderError;
use crate::geo::haversine_km;
use crate::model::{Leg, Location, TransportMode};
use crate::traits::{Deadline, DirectionsProvider};

/// Haversine-based directions provider.
///
/// Distance is the straight-line distance stretched by `detour_factor`;
/// duration assumes a constant average speed per mode.
#[derive(Debug, Clone)]
pub struct HaversineDirections {
    pub car_kmh: f64,
    pub bicycle_kmh: f64,
    pub walking_kmh: f64,
    pub transit_kmh: f64,
    /// Ratio of road distance to straight-line distance.
    pub detour_factor: f64,
}

impl Default for HaversineDirections {
    fn default() -> Self {
        Self {
            car_kmh: 40.0,
            bicycle_kmh: 15.0,
            walking_kmh: 5.0,
            transit_kmh: 25.0,
            detour_factor: 1.0,
        }
    }
}

impl HaversineDirections {
    fn speed_kmh(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Car => self.car_kmh,
            TransportMode::Bicycle => self.bicycle_kmh,
            TransportMode::Walking => self.walking_kmh,
            TransportMode::PublicTransit => self.transit_kmh,
        }
    }

    /// Convert distance in km to travel time in whole seconds.
    fn km_to_duration(&self, km: f64, mode: TransportMode) -> Option<Duration> {
        let hours = km / self.speed_kmh(mode);
        Duration::try_from_secs_f64((hours * 3600.0).round()).ok()
    }
}

impl DirectionsProvider for HaversineDirections {
    fn route(
        &self,
        origin: &Location,
        destination: &Location,
        mode: TransportMode,
        deadline: Deadline,
    ) -> Result<Leg, ProviderError> {
        if deadline.is_expired() {
            return Err(ProviderError::DeadlineExceeded);
        }

        let km = haversine_km(origin.coords(), destination.coords()) * self.detour_factor;
        let duration = self
            .km_to_duration(km, mode)
            .ok_or(ProviderError::UnsupportedMode(mode))?;

        Ok(Leg {
            distance_m: km * 1000.0,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    #[test]
    fn test_same_point_is_zero() {
        let provider = HaversineDirections::default();
        let here = Location::new(52.52, 13.405);
        let leg = provider
            .route(&here, &here, TransportMode::Car, deadline())
            .expect("route");
        assert!(leg.distance_m < 1.0);
        assert_eq!(leg.duration, Duration::ZERO);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineDirections::default(); // 40 km/h
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        let duration = provider.km_to_duration(10.0, TransportMode::Car).expect("duration");
        assert_eq!(duration, Duration::from_secs(900));
    }

    #[test]
    fn test_walking_is_slower_than_cycling() {
        let provider = HaversineDirections::default();
        let from = Location::new(52.52, 13.405);
        let to = Location::new(52.50, 13.45);
        let walk = provider.route(&from, &to, TransportMode::Walking, deadline()).expect("walk");
        let bike = provider.route(&from, &to, TransportMode::Bicycle, deadline()).expect("bike");
        assert_eq!(walk.distance_m, bike.distance_m);
        assert!(walk.duration > bike.duration);
    }

    #[test]
    fn test_zero_speed_mode_is_unsupported() {
        let provider = HaversineDirections {
            transit_kmh: 0.0,
            ..HaversineDirections::default()
        };
        let err = provider
            .route(
                &Location::new(52.52, 13.405),
                &Location::new(48.137, 11.575),
                TransportMode::PublicTransit,
                deadline(),
            )
            .expect_err("transit disabled");
        assert!(matches!(err, ProviderError::UnsupportedMode(TransportMode::PublicTransit)));
    }

    #[test]
    fn test_expired_deadline() {
        let provider = HaversineDirections::default();
        let expired = Deadline::at(std::time::Instant::now() - Duration::from_millis(1));
        let here = Location::new(52.52, 13.405);
        let err = provider.route(&here, &here, TransportMode::Car, expired).expect_err("expired");
        assert!(matches!(err, ProviderError::DeadlineExceeded));
    }
}
