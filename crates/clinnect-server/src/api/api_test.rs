use axum::body::{to_bytes, Body};
use axum::http::Request;
use clinnect_core::{
    ContactInfo, Coordinate, Place, ProviderKind, ProviderRecord, SiteCoordinates,
    StaticDirectory, UpstreamError,
};
use futures::future::{BoxFuture, FutureExt};
use tower::ServiceExt;

use super::*;

struct StraightRouter;

impl RoutingProvider for StraightRouter {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Vec<Coordinate>>, UpstreamError>> {
        async move { Ok(Some(vec![origin, destination])) }.boxed()
    }
}

struct NoRouteRouter;

impl RoutingProvider for NoRouteRouter {
    fn route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> BoxFuture<'_, Result<Option<Vec<Coordinate>>, UpstreamError>> {
        async { Ok(None) }.boxed()
    }
}

struct OnePlaceGeocoder;

impl Geocoder for OnePlaceGeocoder {
    fn geocode<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<Place>, UpstreamError>> {
        async move {
            Ok(vec![Place {
                display_name: format!("{text}, Metro Manila"),
                coordinate: Coordinate::new(14.5995, 120.9842).expect("valid"),
            }])
        }
        .boxed()
    }
}

struct DownDirectory;

impl ProviderDirectory for DownDirectory {
    fn find_providers_by_insurance<'a>(
        &'a self,
        _substr: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ProviderRecord>, UpstreamError>> {
        async { Err(UpstreamError::Unavailable("database offline".to_string())) }.boxed()
    }
}

fn row(name: &str, kind: ProviderKind, lat: f64, lon: f64, insurance: &str) -> ProviderRecord {
    ProviderRecord {
        name: name.to_string(),
        kind,
        address: format!("{name} address"),
        contact: ContactInfo {
            phone: Some("+63 2 8888 8999".to_string()),
            ..ContactInfo::default()
        },
        location: SiteCoordinates::for_kind(kind, Some(lat.into()), Some(lon.into())),
        insurance_name: Some(insurance.to_string()),
    }
}

fn directory() -> Arc<dyn ProviderDirectory> {
    Arc::new(StaticDirectory::new(vec![
        row("Cebu Doctors", ProviderKind::Hospital, 10.3157, 123.8854, "Maxicare"),
        row("Near Clinic", ProviderKind::Clinic, 14.6000, 120.9850, "Maxicare"),
        row("Near Clinic", ProviderKind::Clinic, 14.6000, 120.9850, "PhilHealth"),
    ]))
}

fn state_with(directory: Arc<dyn ProviderDirectory>, router: Arc<dyn RoutingProvider>) -> AppState {
    AppState {
        pool: None,
        directory,
        router,
        geocoder: Arc::new(OnePlaceGeocoder),
        settings: SessionSettings::default(),
    }
}

fn app() -> Router {
    build_app(
        state_with(directory(), Arc::new(StraightRouter)),
        default_rate_limit_state(),
    )
}

async fn fetch(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("routing_unavailable", StatusCode::BAD_GATEWAY),
        ("upstream_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("something_else", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

#[tokio::test]
async fn search_returns_bare_array_of_aggregated_providers() {
    let (status, json) = fetch(app(), "/api/search?query=maxicare").await;
    assert_eq!(status, StatusCode::OK);

    let items = json.as_array().expect("bare array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Cebu Doctors");
    assert_eq!(items[1]["name"], "Near Clinic");
    assert_eq!(items[1]["type"], "clinic");
    assert_eq!(items[1]["contact"], "+63 2 8888 8999");
    assert_eq!(items[1]["insurances"], serde_json::json!(["Maxicare"]));
    assert!(items[1].get("phone").is_none());
    assert!(items[1].get("distance_km").is_none());
}

#[tokio::test]
async fn search_with_position_filters_and_reports_distance() {
    let (status, json) = fetch(app(), "/api/search?query=maxicare&lat=14.5995&lon=120.9842").await;
    assert_eq!(status, StatusCode::OK);

    let items = json.as_array().expect("bare array");
    assert_eq!(items.len(), 1);
    let km = items[0]["distance_km"].as_f64().expect("distance");
    assert!(km < 0.2, "got {km}");
}

#[tokio::test]
async fn search_with_position_lists_nearest_first() {
    let (_, json) = fetch(
        app(),
        "/api/search?query=maxicare&lat=14.5995&lon=120.9842&radius_km=1000",
    )
    .await;
    let items = json.as_array().expect("bare array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Near Clinic");
    assert_eq!(items[1]["name"], "Cebu Doctors");

    let near = items[0]["distance_km"].as_f64().expect("distance");
    let far = items[1]["distance_km"].as_f64().expect("distance");
    assert!(near < far, "{near} should be below {far}");
}

#[tokio::test]
async fn search_without_matches_is_empty_array() {
    let (status, json) = fetch(app(), "/api/search?query=NonexistentInsurerXYZ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn blank_search_is_bad_request() {
    let (status, json) = fetch(app(), "/api/search?query=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");

    let (status, _) = fetch(app(), "/api/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_with_lat_but_no_lon_is_rejected() {
    let (status, json) = fetch(app(), "/api/search?query=maxicare&lat=14.6").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn search_with_bad_radius_is_rejected() {
    let (status, _) = fetch(app(), "/api/search?query=maxicare&radius_km=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_upstream_failure_is_service_unavailable() {
    let app = build_app(
        state_with(Arc::new(DownDirectory), Arc::new(StraightRouter)),
        default_rate_limit_state(),
    );
    let (status, json) = fetch(app, "/api/search?query=maxicare").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "upstream_unavailable");
}

#[tokio::test]
async fn route_returns_simulated_segments() {
    let (status, json) = fetch(app(), "/api/v1/route?from=14.5995,120.9842&to=14.6,120.985").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    assert_eq!(data["simulated"], true);
    let segments = data["segments"].as_array().expect("segments");
    assert_eq!(segments.len(), 1);
    let color = segments[0]["color"].as_str().expect("color");
    assert!(["green", "orange", "red"].contains(&color));
    let heading = segments[0]["heading_deg"].as_f64().expect("heading");
    assert!((0.0..360.0).contains(&heading));
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn route_with_malformed_point_is_validation_error() {
    let (status, json) = fetch(app(), "/api/v1/route?from=north&to=14.6,120.985").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn route_without_geometry_is_bad_gateway() {
    let app = build_app(
        state_with(directory(), Arc::new(NoRouteRouter)),
        default_rate_limit_state(),
    );
    let (status, json) = fetch(app, "/api/v1/route?from=14.5995,120.9842&to=14.6,120.985").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "routing_unavailable");
}

#[tokio::test]
async fn geocode_wraps_places_in_envelope() {
    let (status, json) = fetch(app(), "/api/v1/geocode?q=Ermita").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["display_name"], "Ermita, Metro Manila");
}

#[tokio::test]
async fn geocode_requires_text() {
    let (status, _) = fetch(app(), "/api/v1/geocode?q=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_without_database_is_degraded() {
    let (status, json) = fetch(app(), "/api/v1/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
    assert_eq!(json["data"]["database"], "not_configured");
}

#[tokio::test]
async fn health_is_not_rate_limited() {
    let app = build_app(
        state_with(directory(), Arc::new(StraightRouter)),
        RateLimitState::new(0, Duration::from_secs(60)),
    );
    let (status, _) = fetch(app.clone(), "/api/v1/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = fetch(app, "/api/search?query=maxicare").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
