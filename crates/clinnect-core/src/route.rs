//! Route annotation: path geometry from the routing port, split into segments,
//! each tagged with a congestion level.
//!
//! **The congestion levels are simulated.** No traffic feed is consulted; each
//! segment's level is drawn from the injected random source. Every
//! [`AnnotatedRoute`] carries `simulated: true` so consumers can say so.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{RouteError, UpstreamError};
use crate::geo::{distance, Coordinate};
use crate::ports::RoutingProvider;

const LIGHT_BELOW: f64 = 0.3;
const MODERATE_BELOW: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    Light,
    Moderate,
    Heavy,
}

impl CongestionLevel {
    /// Stroke colour used by map clients for this level.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            CongestionLevel::Light => "green",
            CongestionLevel::Moderate => "orange",
            CongestionLevel::Heavy => "red",
        }
    }
}

/// Map a uniform draw `r ∈ [0, 1)` to a congestion level.
///
/// `r < 0.3` is light, `0.3 ≤ r < 0.7` moderate, `r ≥ 0.7` heavy.
#[must_use]
pub fn classify(r: f64) -> CongestionLevel {
    if r < LIGHT_BELOW {
        CongestionLevel::Light
    } else if r < MODERATE_BELOW {
        CongestionLevel::Moderate
    } else {
        CongestionLevel::Heavy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: Coordinate,
    pub to: Coordinate,
    pub congestion: CongestionLevel,
}

impl RouteSegment {
    #[must_use]
    pub fn length_km(&self) -> f64 {
        distance(self.from, self.to)
    }
}

/// Ordered segments from origin to destination with simulated congestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRoute {
    segments: Vec<RouteSegment>,
    /// Always `true`: congestion is synthetic, never live traffic.
    simulated: bool,
}

impl AnnotatedRoute {
    #[must_use]
    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    #[must_use]
    pub fn total_km(&self) -> f64 {
        self.segments.iter().map(RouteSegment::length_km).sum()
    }
}

/// Split `points` into consecutive segments and classify each one.
///
/// `n` points give `n - 1` segments; fewer than two points give none.
pub fn annotate_path<R: Rng + ?Sized>(points: &[Coordinate], rng: &mut R) -> AnnotatedRoute {
    let segments = points
        .windows(2)
        .filter_map(|pair| match pair {
            [from, to] => Some(RouteSegment {
                from: *from,
                to: *to,
                congestion: classify(rng.random::<f64>()),
            }),
            _ => None,
        })
        .collect();

    AnnotatedRoute {
        segments,
        simulated: true,
    }
}

/// Fetch path geometry for `(origin, destination)` and annotate it.
///
/// No retries are attempted; retry policy belongs to the caller.
///
/// # Errors
///
/// Returns [`RouteError::RoutingUnavailable`] when the provider fails, takes
/// longer than `limit`, finds no route, or returns an empty geometry.
pub async fn annotate_route<R: Rng + Send + ?Sized>(
    router: &dyn RoutingProvider,
    origin: Coordinate,
    destination: Coordinate,
    limit: Duration,
    rng: &mut R,
) -> Result<AnnotatedRoute, RouteError> {
    let points = fetch_geometry(router, origin, destination, limit).await?;
    Ok(annotate_path(&points, rng))
}

/// Geometry lookup with the same failure mapping as [`annotate_route`].
pub(crate) async fn fetch_geometry(
    router: &dyn RoutingProvider,
    origin: Coordinate,
    destination: Coordinate,
    limit: Duration,
) -> Result<Vec<Coordinate>, RouteError> {
    let geometry = tokio::time::timeout(limit, router.route(origin, destination))
        .await
        .map_err(|_| UpstreamError::Timeout(limit))??;

    match geometry {
        None => Err(RouteError::RoutingUnavailable(
            "provider found no route".to_string(),
        )),
        Some(points) if points.is_empty() => Err(RouteError::RoutingUnavailable(
            "provider returned empty geometry".to_string(),
        )),
        Some(points) => {
            tracing::debug!(%origin, %destination, points = points.len(), "route geometry received");
            Ok(points)
        }
    }
}
