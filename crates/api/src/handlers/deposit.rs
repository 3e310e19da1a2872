use axum::extract::{Json, State};
use onagui_core::app_state::AppState;
use onagui_core::services::deposit_service::DepositService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::{DepositRequest, DepositResponse};
use std::sync::Arc;
use validator::Validate;

/// Credit a confirmed on-chain deposit. Exactly-once per transaction hash:
/// a hash that has already been credited returns 409 and does not move the
/// balance again.
#[utoipa::path(
    post,
    path = "/api/deposits",
    tag = "Deposits",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit credited", body = DepositResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 404, description = "Unknown user", body = ApiErrorResponse),
        (status = 409, description = "Transaction hash already credited", body = ApiErrorResponse),
    ),
)]
pub async fn process_deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, LedgerError> {
    req.validate()?;

    let entry = DepositService::process_deposit(&state, req).await?;

    Ok(Json(DepositResponse { entry_id: entry.id }))
}
