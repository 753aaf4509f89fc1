use axum::{
    extract::{Query, State},
    Extension, Json,
};
use clinnect_core::{Place, UpstreamError};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeQuery {
    pub q: Option<String>,
}

pub(super) async fn geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<ApiResponse<Vec<Place>>>, ApiError> {
    let text = params.q.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ApiError::new(req_id.0, "bad_request", "q must not be blank"));
    }

    let limit = state.settings.lookup_timeout;
    let places = tokio::time::timeout(limit, state.geocoder.geocode(text.trim()))
        .await
        .unwrap_or(Err(UpstreamError::Timeout(limit)))
        .map_err(|e| {
            tracing::warn!(q = %text, error = %e, "geocode failed");
            ApiError::new(req_id.0.clone(), "upstream_unavailable", e.to_string())
        })?;

    Ok(Json(ApiResponse {
        data: places,
        meta: ResponseMeta::new(req_id.0),
    }))
}
