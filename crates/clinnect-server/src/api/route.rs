use axum::{
    extract::{Query, State},
    Extension, Json,
};
use clinnect_core::{annotate_route, bearing, CongestionLevel, Coordinate, RouteSegment};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RouteQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SegmentItem {
    pub from: Coordinate,
    pub to: Coordinate,
    pub congestion: CongestionLevel,
    pub color: &'static str,
    pub length_km: f64,
    /// Initial compass bearing from `from` to `to`, in degrees.
    pub heading_deg: f64,
}

impl From<&RouteSegment> for SegmentItem {
    fn from(segment: &RouteSegment) -> Self {
        Self {
            from: segment.from,
            to: segment.to,
            congestion: segment.congestion,
            color: segment.congestion.color(),
            length_km: segment.length_km(),
            heading_deg: bearing(segment.from, segment.to),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RouteItem {
    pub segments: Vec<SegmentItem>,
    pub simulated: bool,
    pub total_km: f64,
}

fn parse_point(req_id: &str, name: &str, raw: Option<&str>) -> Result<Coordinate, ApiError> {
    let raw = raw.ok_or_else(|| {
        ApiError::new(req_id, "validation_error", format!("{name} is required"))
    })?;
    raw.parse::<Coordinate>()
        .map_err(|e| ApiError::new(req_id, "validation_error", format!("{name}: {e}")))
}

pub(super) async fn annotated_route(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<RouteQuery>,
) -> Result<Json<ApiResponse<RouteItem>>, ApiError> {
    let from = parse_point(&req_id.0, "from", params.from.as_deref())?;
    let to = parse_point(&req_id.0, "to", params.to.as_deref())?;

    let mut rng = StdRng::from_os_rng();
    let route = annotate_route(
        state.router.as_ref(),
        from,
        to,
        state.settings.lookup_timeout,
        &mut rng,
    )
    .await
    .map_err(|e| {
        tracing::warn!(%from, %to, error = %e, "route request failed");
        ApiError::new(req_id.0.clone(), "routing_unavailable", e.to_string())
    })?;

    let data = RouteItem {
        segments: route.segments().iter().map(SegmentItem::from).collect(),
        simulated: route.is_simulated(),
        total_km: route.total_km(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
