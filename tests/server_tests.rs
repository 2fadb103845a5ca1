//! HTTP surface driven through the router without binding a socket.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use greenroute::charging::NoChargingStations;
use greenroute::engine::{EngineOptions, RouteEngine};
use greenroute::haversine::HaversineDirections;
use greenroute::server::{ApiState, router};
use greenroute::store::SqliteStore;

fn app() -> axum::Router {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let engine = RouteEngine::new(
        Box::new(HaversineDirections::default()),
        Box::new(store.clone()),
        Box::new(store),
        Box::new(NoChargingStations),
        EngineOptions::default(),
    );
    router(ApiState {
        engine: Arc::new(engine),
    })
}

fn calculate(body: Value) -> Request<Body> {
    Request::post("/api/v1/routes/calculate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn berlin_to_munich(modes: Value) -> Value {
    json!({
        "start_location": {"latitude": 52.52, "longitude": 13.405, "address": "Berlin"},
        "end_location": {"latitude": 48.137, "longitude": 11.575},
        "preferences": {"preferred_modes": modes},
        "user_id": "u-1"
    })
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_route_lookup_is_not_implemented() {
    let response = app()
        .oneshot(Request::get("/api/v1/routes/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(json_body(response).await["error"], "Not implemented yet");
}

#[tokio::test]
async fn test_unknown_mode_is_bad_request() {
    let response = app()
        .oneshot(calculate(berlin_to_munich(json!(["car", "hovercraft"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let response = app()
        .oneshot(
            Request::post("/api/v1/routes/calculate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"start_location\":"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_out_of_range_latitude_is_bad_request() {
    let mut body = berlin_to_munich(json!(["car"]));
    body["start_location"]["latitude"] = json!(95.0);

    let response = app().oneshot(calculate(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("out of range"), "got {}", error);
}

#[tokio::test]
async fn test_no_modes_is_unprocessable() {
    let response = app().oneshot(calculate(berlin_to_munich(json!([])))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_calculated_route_is_returned() {
    let response = app()
        .oneshot(calculate(berlin_to_munich(json!(["bicycle", "car"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let route = &body["route"];
    assert_eq!(route["id"], 1);
    assert_eq!(route["user_id"], "u-1");
    assert_eq!(route["segments"].as_array().unwrap().len(), 2);
    assert_eq!(route["segments"][0]["mode"], "bicycle");
    assert_eq!(body["charging_stations"], json!([]));
}
