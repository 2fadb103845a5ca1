//! Coordinate validation and great-circle distance.

use crate::error::RouteError;
use crate::model::Location;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

pub fn is_valid_longitude(lng: f64) -> bool {
    (-180.0..=180.0).contains(&lng)
}

/// Latitude in [-90, 90] and longitude in [-180, 180]. NaN is never valid.
pub fn is_valid(location: &Location) -> bool {
    is_valid_latitude(location.latitude) && is_valid_longitude(location.longitude)
}

/// Checks both endpoints of a trip.
pub fn validate(start: &Location, end: &Location) -> Result<(), RouteError> {
    for (label, location) in [("start", start), ("end", end)] {
        if !is_valid(location) {
            return Err(RouteError::Validation(format!(
                "{} location {} is out of range",
                label, location
            )));
        }
    }
    Ok(())
}

/// Haversine distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
