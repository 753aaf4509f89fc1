//! Client for the OSRM `route` service.
//!
//! Only path geometry (plus OSRM's own distance/duration estimates) is
//! fetched. OSRM has no live traffic data; the congestion labels added by
//! `clinnect_core::route` are simulated.

use clinnect_core::{Coordinate, CoordinateError, RoutingProvider, UpstreamError};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::MapsError;
use crate::http::{build_client, join, parse_base_url};

pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

const PROFILE: &str = "driving";

/// The first route OSRM returned for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct OsrmRoute {
    pub coordinates: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Deserialize)]
struct RouteEnvelope {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    geometry: LineString,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

/// GeoJSON `LineString`; positions are `[longitude, latitude]`.
#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

pub struct OsrmClient {
    client: Client,
    base_url: Url,
}

impl OsrmClient {
    /// Creates a client pointed at the public OSRM demo server.
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, MapsError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent)
    }

    /// Creates a client with a custom base URL (self-hosted OSRM, or wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`MapsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, MapsError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// `route/v1/driving/{lon},{lat};{lon},{lat}?overview=full&geometries=geojson`
    fn build_url(&self, origin: Coordinate, destination: Coordinate) -> Result<Url, MapsError> {
        let path = format!(
            "route/v1/{PROFILE}/{},{};{},{}",
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude()
        );
        let mut url = join(&self.base_url, &path)?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        Ok(url)
    }

    /// Fetches the first route between two points.
    ///
    /// Returns `Ok(None)` when OSRM answers with any code other than `"Ok"`
    /// (`NoRoute`, `NoSegment`, ...) or with an empty route list.
    ///
    /// # Errors
    ///
    /// - [`MapsError::Http`] on network failure or timeout.
    /// - [`MapsError::UnexpectedStatus`] on a server error, or a client error
    ///   without an OSRM JSON body.
    /// - [`MapsError::Deserialize`] if a successful response has the wrong shape.
    /// - [`MapsError::InvalidGeometry`] if any position is out of range; the
    ///   whole geometry is rejected rather than bridged over the bad point.
    pub async fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Option<OsrmRoute>, MapsError> {
        let url = self.build_url(origin, destination)?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status.is_server_error() {
            return Err(MapsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        // OSRM reports NoRoute and friends as 400 with a JSON body.
        let envelope: RouteEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(MapsError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Err(e) => {
                return Err(MapsError::Deserialize {
                    context: format!("osrm route {origin} -> {destination}"),
                    source: e,
                });
            }
        };

        if envelope.code != "Ok" {
            tracing::debug!(
                code = %envelope.code,
                message = envelope.message.as_deref().unwrap_or(""),
                "osrm returned no route"
            );
            return Ok(None);
        }

        let Some(first) = envelope.routes.into_iter().next() else {
            return Ok(None);
        };

        let coordinates =
            to_coordinates(&first.geometry.coordinates).map_err(|e| {
                MapsError::InvalidGeometry {
                    context: format!("osrm route {origin} -> {destination}"),
                    reason: e.to_string(),
                }
            })?;
        Ok(Some(OsrmRoute {
            coordinates,
            distance_m: first.distance,
            duration_s: first.duration,
        }))
    }
}

/// Convert GeoJSON `[lon, lat]` positions, failing on the first invalid one.
fn to_coordinates(positions: &[[f64; 2]]) -> Result<Vec<Coordinate>, CoordinateError> {
    positions
        .iter()
        .map(|[lon, lat]| Coordinate::new(*lat, *lon))
        .collect()
}

impl RoutingProvider for OsrmClient {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Vec<Coordinate>>, UpstreamError>> {
        async move {
            let route = self.fetch_route(origin, destination).await?;
            Ok::<_, UpstreamError>(route.map(|r| r.coordinates))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> OsrmClient {
        OsrmClient::with_base_url(base_url, 5, "clinnect-test").unwrap()
    }

    #[test]
    fn build_url_orders_longitude_first() {
        let client = test_client("https://router.project-osrm.org");
        let url = client
            .build_url(
                Coordinate::new(14.5995, 120.9842).unwrap(),
                Coordinate::new(14.6, 121.0).unwrap(),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://router.project-osrm.org/route/v1/driving/120.9842,14.5995;121,14.6?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn positions_are_swapped_to_lat_lon() {
        let coords = to_coordinates(&[[120.98, 14.59], [121.0, 14.6]]).unwrap();
        assert_eq!(coords.len(), 2);
        assert!((coords[0].latitude() - 14.59).abs() < 1e-9);
        assert!((coords[0].longitude() - 120.98).abs() < 1e-9);
    }

    #[test]
    fn one_invalid_position_rejects_the_geometry() {
        let err = to_coordinates(&[[120.98, 14.59], [200.0, 14.0], [121.0, 14.6]]).unwrap_err();
        assert!(matches!(err, CoordinateError::LongitudeOutOfRange(_)));
    }
}
