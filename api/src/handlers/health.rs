use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use tracing::info;

use crate::{error::ApiResult, models::HealthResponse, AppState};

/// Health check endpoint
///
/// GET /api/v1/health
///
/// Liveness only. Not behind the authorization gate and does not call the
/// decision engine.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("Health check requested");

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        decision_engine: state.decision.name().to_string(),
    };

    Ok(Json(response))
}
