//! CO2 emission estimates per transport mode.

use crate::model::TransportMode;

/// Grams of CO2 per kilometer travelled.
pub fn grams_per_km(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Car => 120.0,
        TransportMode::PublicTransit => 60.0,
        TransportMode::Bicycle | TransportMode::Walking => 0.0,
    }
}

/// Estimated grams of CO2 for travelling `distance_m` meters by `mode`.
pub fn estimate(mode: TransportMode, distance_m: f64) -> f64 {
    distance_m / 1000.0 * grams_per_km(mode)
}
