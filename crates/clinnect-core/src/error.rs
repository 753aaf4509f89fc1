use std::time::Duration;

use thiserror::Error;

/// Failure talking to an external collaborator (data source, geocoder, router).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The routing provider failed, timed out, or returned no geometry.
    #[error("routing unavailable: {0}")]
    RoutingUnavailable(String),
}

impl From<UpstreamError> for RouteError {
    fn from(err: UpstreamError) -> Self {
        RouteError::RoutingUnavailable(err.to_string())
    }
}
