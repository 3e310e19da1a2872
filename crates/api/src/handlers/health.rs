use axum::{extract::State, http::StatusCode, Json};
use onagui_core::app_state::AppState;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus),
        (status = 503, description = "Ledger store unreachable", body = HealthStatus),
    ),
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    match state.store.ping() {
        Ok(()) => Json(HealthStatus {
            status: StatusCode::OK.to_string(),
            message: "Ledger is healthy".to_string(),
        }),
        Err(e) => {
            error!("Health check store ping failed: {}", e);
            Json(HealthStatus {
                status: StatusCode::SERVICE_UNAVAILABLE.to_string(),
                message: "Ledger store unreachable".to_string(),
            })
        }
    }
}
