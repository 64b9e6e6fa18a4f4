//! HTTP API: live status and down-sampled history

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::downsample::{QueryParams, DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_WIDTH};
use crate::error::StationError;
use crate::history::HistoryReader;
use crate::sampler::CurrentReading;

/// Server application state
#[derive(Clone)]
pub struct ApiState {
    pub history: HistoryReader,
    pub current: CurrentReading,
}

/// Raw `/history` query string
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_readings")]
    pub readings: i64,
    #[serde(default = "default_interval")]
    pub interval: i64,
}

fn default_readings() -> i64 {
    DEFAULT_BUCKET_COUNT as i64
}

fn default_interval() -> i64 {
    DEFAULT_BUCKET_WIDTH as i64
}

impl IntoResponse for StationError {
    fn into_response(self) -> Response {
        let status = match self {
            StationError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the API router
///
/// With `cors_allow_origin` set, browsers on that origin may call the API.
pub fn build_router(state: ApiState, cors_allow_origin: Option<&str>) -> Router {
    let router = Router::new()
        .route("/status", get(status_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    match cors_allow_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => router.layer(CorsLayer::new().allow_origin(origin)),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS origin: {}", e);
            router
        }
        None => router,
    }
}

async fn status_handler(State(api): State<ApiState>) -> impl IntoResponse {
    let current = *api.current.borrow();
    match current {
        Some(reading) => Json(serde_json::to_value(reading).unwrap_or_default()),
        None => Json(serde_json::json!({})),
    }
}

async fn history_handler(
    State(api): State<ApiState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<impl IntoResponse, StationError> {
    let Query(query) = query.map_err(|e| StationError::InvalidArgument(e.body_text()))?;
    let params = QueryParams::new(query.readings, query.interval)?;

    let buckets = api.history.query(params).await;
    debug!(
        "History query readings={} interval={} -> {} buckets",
        query.readings,
        query.interval,
        buckets.len()
    );

    Ok(Json(buckets))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
