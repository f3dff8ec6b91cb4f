use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;
use utoipa::ToSchema;

use crate::{errors::ServiceError, ApiResponse, AppState};

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Records the process start; call once on startup.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    pub environment: String,
    pub search_engine: String,
    pub search_language: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub latency_ms: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    summary = "Service status",
    responses((status = 200, description = "Service is running", body = ApiResponse<StatusInfo>)),
    tag = "Health"
)]
pub async fn api_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatusInfo>>, ServiceError> {
    Ok(Json(ApiResponse::success(StatusInfo {
        status: "ok".into(),
        service: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        environment: state.config.environment.clone(),
        search_engine: state.search.name().into(),
        search_language: state.search.language().regconfig().to_string(),
        uptime_secs: uptime_secs(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    summary = "Database health",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<HealthStatus>),
        (status = 500, description = "Database unreachable", body = crate::errors::ErrorResponse),
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthStatus>>, ServiceError> {
    let start = Instant::now();
    crate::db::check_connection(&state.db).await?;
    Ok(Json(ApiResponse::success(HealthStatus {
        status: "healthy".into(),
        database: "up".into(),
        latency_ms: start.elapsed().as_millis() as u64,
    })))
}
