use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use clinnect_core::{
    rank_by_distance, AggregatedProvider, Coordinate, SearchSession, SearchStatus,
    SessionSettings,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
}

/// One aggregated provider, plus its distance when the caller sent a position.
#[derive(Debug, Serialize)]
pub(super) struct ProviderItem {
    #[serde(flatten)]
    pub provider: AggregatedProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

fn parse_origin(req_id: &str, params: &SearchQuery) -> Result<Option<Coordinate>, ApiError> {
    match (params.lat, params.lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
            .map(Some)
            .map_err(|e| ApiError::new(req_id, "validation_error", e.to_string())),
        _ => Err(ApiError::new(
            req_id,
            "validation_error",
            "lat and lon must be given together",
        )),
    }
}

fn session_settings(
    req_id: &str,
    base: SessionSettings,
    radius_km: Option<f64>,
) -> Result<SessionSettings, ApiError> {
    match radius_km {
        None => Ok(base),
        Some(r) if r.is_finite() && r > 0.0 => Ok(SessionSettings {
            radius_km: r,
            ..base
        }),
        Some(r) => Err(ApiError::new(
            req_id,
            "validation_error",
            format!("radius_km must be a positive number, got {r}"),
        )),
    }
}

/// `GET /api/search` answers with a bare array, the shape map clients expect.
///
/// With a position, providers come nearest first with their distance;
/// without one, in aggregation order.
pub(super) async fn search_providers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<ProviderItem>>, ApiError> {
    let origin = parse_origin(&req_id.0, &params)?;
    let settings = session_settings(&req_id.0, state.settings, params.radius_km)?;

    let mut session = SearchSession::new(
        Arc::clone(&state.directory),
        Arc::clone(&state.router),
        settings,
    );
    if let Some(origin) = origin {
        session.set_origin(origin);
    }

    let query = params.query.unwrap_or_default();
    match session.search(&query).await {
        SearchStatus::Rejected => {
            return Err(ApiError::new(
                req_id.0,
                "bad_request",
                "query must not be blank",
            ));
        }
        SearchStatus::UpstreamUnavailable(reason) => {
            return Err(ApiError::new(
                req_id.0,
                "upstream_unavailable",
                reason.clone(),
            ));
        }
        SearchStatus::Idle | SearchStatus::NoMatch | SearchStatus::Found(_) => {}
    }

    let results = &session.context().current_results;
    let items: Vec<ProviderItem> = match origin {
        Some(origin) => rank_by_distance(results, origin)
            .into_iter()
            .map(|(provider, km)| ProviderItem {
                provider,
                distance_km: Some(km),
            })
            .collect(),
        None => results
            .iter()
            .cloned()
            .map(|provider| ProviderItem {
                provider,
                distance_km: None,
            })
            .collect(),
    };

    Ok(Json(items))
}
