pub mod aggregate;
pub mod app_config;
pub mod config;
pub mod directory;
pub mod error;
pub mod geo;
pub mod ports;
pub mod provider;
pub mod providers_file;
pub mod proximity;
pub mod route;
pub mod session;

use thiserror::Error;

pub use aggregate::{aggregate, aggregate_with_diagnostics, Aggregation, ConflictingProviderData};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use directory::StaticDirectory;
pub use error::{RouteError, UpstreamError};
pub use geo::{bearing, distance, Coordinate, CoordinateError, DEFAULT_ORIGIN, EARTH_RADIUS_KM};
pub use ports::{Geocoder, Place, ProviderDirectory, RoutingProvider};
pub use provider::{
    AggregatedProvider, ContactInfo, CoordinateValue, MalformedCoordinate, ProviderKey,
    ProviderKind, ProviderRecord, Site, SiteCoordinates,
};
pub use providers_file::{load_providers_file, ProviderEntry, ProvidersFile};
pub use proximity::{filter_within_radius, rank_by_distance, DEFAULT_SEARCH_RADIUS_KM};
pub use route::{
    annotate_path, annotate_route, classify, AnnotatedRoute, CongestionLevel, RouteSegment,
};
pub use session::{
    Applied, RouteResponse, RouteTicket, SearchContext, SearchResponse, SearchSession,
    SearchStatus, SearchTicket, SessionSettings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read providers file {path}: {source}")]
    ProvidersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse providers file: {0}")]
    ProvidersFileParse(#[source] serde_yaml::Error),

    #[error("providers file validation failed: {0}")]
    Validation(String),
}
