//! HTTP adapters for the public map services behind the routing and
//! geocoding ports: OSRM for path geometry, Nominatim for place search.

pub mod error;
mod http;
pub mod nominatim;
pub mod osrm;

pub use error::MapsError;
pub use nominatim::NominatimClient;
pub use osrm::{OsrmClient, OsrmRoute};
