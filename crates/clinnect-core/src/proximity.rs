//! Radius filtering of aggregated providers around an origin.

use crate::geo::{distance, Coordinate};
use crate::provider::{AggregatedProvider, Site};

/// Radius applied by the search orchestrator when none is configured.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 5.0;

/// Distance to a provider's resolved coordinate, `None` if it does not resolve.
fn site_distance(provider: &impl Site, origin: Coordinate) -> Option<f64> {
    match provider.coordinate() {
        Ok(coord) => Some(distance(origin, coord)),
        Err(e) => {
            tracing::debug!(error = %e, "excluding provider from proximity results");
            None
        }
    }
}

/// Keep providers whose resolved coordinate is within `radius_km` of `origin`.
///
/// The boundary is inclusive. Providers with malformed coordinates never
/// match. Input order is preserved. A negative or non-finite radius matches
/// nothing.
#[must_use]
pub fn filter_within_radius(
    providers: &[AggregatedProvider],
    origin: Coordinate,
    radius_km: f64,
) -> Vec<AggregatedProvider> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Vec::new();
    }

    providers
        .iter()
        .filter(|p| site_distance(*p, origin).is_some_and(|d| d <= radius_km))
        .cloned()
        .collect()
}

/// Pair each locatable provider with its distance from `origin`, nearest first.
///
/// Providers with malformed coordinates are dropped. Ties keep input order.
#[must_use]
pub fn rank_by_distance(
    providers: &[AggregatedProvider],
    origin: Coordinate,
) -> Vec<(AggregatedProvider, f64)> {
    let mut ranked: Vec<(AggregatedProvider, f64)> = providers
        .iter()
        .filter_map(|p| site_distance(p, origin).map(|d| (p.clone(), d)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}
