//! greenroute core
//!
//! Multi-modal route aggregation with CO2 estimates, historical traffic
//! adjustment and EV charging stations along the way.

pub mod model;
pub mod geo;
pub mod emission;
pub mod error;
pub mod traits;
pub mod engine;
pub mod charging;
pub mod osrm;
pub mod osrm_data;
pub mod haversine;
pub mod store;
pub mod config;
pub mod server;
