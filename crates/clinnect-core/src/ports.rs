//! Interfaces to the external collaborators.
//!
//! The core never performs I/O directly; the database, the geocoder and the
//! router are reached through these traits. Futures are boxed so the traits
//! stay object-safe and can be shared as `Arc<dyn …>` across request handlers.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::geo::Coordinate;
use crate::provider::ProviderRecord;

/// Read contract of the provider/insurance store.
pub trait ProviderDirectory: Send + Sync {
    /// Rows for every `(provider, insurance)` pair whose insurance name
    /// contains `substr`, compared case-insensitively.
    fn find_providers_by_insurance<'a>(
        &'a self,
        substr: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, UpstreamError>>;
}

/// Path geometry between two points.
///
/// Implementations carry no traffic information; `Ok(None)` means the
/// provider answered but found no route.
pub trait RoutingProvider: Send + Sync {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Vec<Coordinate>>, UpstreamError>>;
}

/// A free-text place search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    pub coordinate: Coordinate,
}

pub trait Geocoder: Send + Sync {
    fn geocode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<Place>, UpstreamError>>;
}
