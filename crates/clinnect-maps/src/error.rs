use clinnect_core::UpstreamError;
use thiserror::Error;

/// Errors returned by the OSRM and Nominatim clients.
#[derive(Debug, Error)]
pub enum MapsError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status the client cannot interpret.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A route geometry contained a position outside the valid range.
    #[error("invalid geometry for {context}: {reason}")]
    InvalidGeometry { context: String, reason: String },

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<MapsError> for UpstreamError {
    fn from(err: MapsError) -> Self {
        UpstreamError::Unavailable(err.to_string())
    }
}
