//! System API endpoints: liveness, readiness and service status.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SystemStatus};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
    pub classifier: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

/// Returns service status, including whether comments are being scored by
/// the model or by the degraded fallback.
///
/// # Endpoint
/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database = state.store().ping().await.is_ok();

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
        classifier_degraded: state.classifier().is_degraded(),
    })))
}

/// `GET /api/health/live`
pub async fn health_live() -> Json<HealthLiveResponse> {
    Json(HealthLiveResponse { status: "ok" })
}

/// Ready once the database answers. A degraded classifier is reported but
/// does not make the service unready, since comments fail open.
///
/// # Endpoint
/// `GET /api/health/ready`
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();
    let classifier = !state.classifier().is_degraded();

    let body = HealthReadyResponse {
        ready: database,
        checks: HealthReadinessChecks {
            database,
            classifier,
        },
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body)).into_response()
}
