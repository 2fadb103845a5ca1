//! HTTP routes: /health, /api/v1/routes/calculate and /api/v1/routes/:id

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::engine::RouteEngine;
use crate::error::RouteError;
use crate::model::{Location, RoutePreferences};

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<RouteEngine>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route("/api/v1/routes/calculate", post(calculate_route))
        .route("/api/v1/routes/:id", get(get_route))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub start_location: Location,
    pub end_location: Location,
    #[serde(default)]
    pub preferences: RoutePreferences,
    #[serde(default)]
    pub user_id: String,
}

async fn calculate_route(
    State(state): State<ApiState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        engine.calculate_route(req.start_location, req.end_location, &req.preferences, &req.user_id)
    })
    .await;

    match result {
        Ok(Ok(route)) => (StatusCode::OK, Json(route)).into_response(),
        Ok(Err(err)) => {
            let status = status_for(&err);
            if status.is_server_error() {
                error!(error = %err, "route calculation failed");
            }
            error_response(status, err.to_string())
        }
        Err(join_err) => {
            error!(error = %join_err, "route calculation task aborted");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        }
    }
}

async fn get_route(Path(_id): Path<String>) -> Response {
    error_response(StatusCode::NOT_IMPLEMENTED, "Not implemented yet".to_string())
}

fn status_for(err: &RouteError) -> StatusCode {
    match err {
        RouteError::Validation(_) => StatusCode::BAD_REQUEST,
        RouteError::NoRouteFound => StatusCode::UNPROCESSABLE_ENTITY,
        RouteError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
