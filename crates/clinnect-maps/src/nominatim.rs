//! Client for the Nominatim free-text `search` endpoint.

use clinnect_core::{Coordinate, Geocoder, Place, UpstreamError};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::MapsError;
use crate::http::{build_client, join, parse_base_url};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

const DEFAULT_LIMIT: u8 = 5;

/// Nominatim returns coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
}

impl SearchHit {
    fn into_place(self) -> Option<Place> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        let coordinate = Coordinate::new(lat, lon).ok()?;
        Some(Place {
            display_name: self.display_name,
            coordinate,
        })
    }
}

pub struct NominatimClient {
    client: Client,
    base_url: Url,
    limit: u8,
}

impl NominatimClient {
    /// Creates a client pointed at the public Nominatim instance.
    ///
    /// The public instance requires an identifying `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, MapsError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent)
    }

    /// Creates a client with a custom base URL.
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
            limit: DEFAULT_LIMIT,
        })
    }

    /// Caps the number of places requested per search.
    #[must_use]
    pub fn with_limit(mut self, limit: u8) -> Self {
        self.limit = limit.max(1);
        self
    }

    fn build_url(&self, text: &str) -> Result<Url, MapsError> {
        let mut url = join(&self.base_url, "search")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", text)
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }

    /// Searches for places matching `text`.
    ///
    /// Hits whose coordinates do not parse are skipped.
    ///
    /// # Errors
    ///
    /// - [`MapsError::Http`] on network failure, timeout, or non-2xx status.
    /// - [`MapsError::Deserialize`] if the response is not a JSON array of hits.
    pub async fn search(&self, text: &str) -> Result<Vec<Place>, MapsError> {
        let url = self.build_url(text)?;
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        let hits: Vec<SearchHit> =
            serde_json::from_str(&body).map_err(|e| MapsError::Deserialize {
                context: format!("nominatim search(q={text})"),
                source: e,
            })?;

        let total = hits.len();
        let places: Vec<Place> = hits.into_iter().filter_map(SearchHit::into_place).collect();
        if places.len() < total {
            tracing::debug!(
                skipped = total - places.len(),
                "nominatim hits with unusable coordinates"
            );
        }
        Ok(places)
    }
}

impl Geocoder for NominatimClient {
    fn geocode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<Place>, UpstreamError>> {
        async move { Ok::<_, UpstreamError>(self.search(text).await?) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_encodes_query() {
        let client =
            NominatimClient::with_base_url("https://nominatim.example", 5, "clinnect-test").unwrap();
        let url = client.build_url("St. Luke's & Co").unwrap();
        assert!(url.as_str().starts_with("https://nominatim.example/search?format=json&q="));
        assert!(url.as_str().contains("%26"), "ampersand must be encoded: {url}");
        assert!(url.as_str().ends_with("&limit=5"));
    }

    #[test]
    fn limit_is_at_least_one() {
        let client = NominatimClient::with_base_url("https://nominatim.example", 5, "ua")
            .unwrap()
            .with_limit(0);
        assert!(client.build_url("x").unwrap().as_str().ends_with("&limit=1"));
    }

    #[test]
    fn hit_with_text_coordinates_becomes_place() {
        let hit = SearchHit {
            display_name: "Manila".to_string(),
            lat: "14.5995".to_string(),
            lon: "120.9842".to_string(),
        };
        let place = hit.into_place().unwrap();
        assert!((place.coordinate.longitude() - 120.9842).abs() < 1e-9);
    }

    #[test]
    fn hit_with_garbage_coordinates_is_skipped() {
        let hit = SearchHit {
            display_name: "Nowhere".to_string(),
            lat: "north".to_string(),
            lon: "0".to_string(),
        };
        assert!(hit.into_place().is_none());
    }
}
