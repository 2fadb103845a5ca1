//! Error types for route calculation and its collaborators.

use thiserror::Error;

use crate::model::TransportMode;

/// Failures surfaced to callers of the route engine.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Bad input coordinates. Never retried.
    #[error("invalid locations provided: {0}")]
    Validation(String),

    /// A required collaborator (route store, traffic lookup) failed.
    #[error("upstream failure: {0}")]
    Upstream(#[from] StoreError),

    /// Every requested mode failed, or none were requested.
    #[error("no valid routes found for any preferred mode")]
    NoRouteFound,
}

/// Failures from directions providers and charging station locators.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no route found")]
    NotFound,

    #[error("transport mode {0} is not supported by this provider")]
    UnsupportedMode(TransportMode),

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider responded with {0}")]
    Status(String),
}

/// Failures from the route and traffic stores.
///
/// Absence of data is not an error; stores report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store deadline exceeded")]
    DeadlineExceeded,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Alias for `Result<T, RouteError>`.
pub type RouteResult<T> = Result<T, RouteError>;
