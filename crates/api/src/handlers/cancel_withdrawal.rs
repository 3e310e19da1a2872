use axum::extract::{Path, State};
use axum::Json;
use onagui_core::app_state::AppState;
use onagui_core::services::withdrawal_service::WithdrawalService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::WithdrawalResponse;
use std::sync::Arc;
use uuid::Uuid;

/// Cancel a withdrawal that has not started processing. Only `pending`
/// withdrawals can be cancelled; anything later returns 409.
#[utoipa::path(
    post,
    path = "/api/withdrawals/{withdrawal_id}/cancel",
    tag = "Withdrawals",
    responses(
        (status = 200, description = "Withdrawal cancelled", body = WithdrawalResponse),
        (status = 404, description = "Unknown withdrawal", body = ApiErrorResponse),
        (status = 409, description = "Withdrawal is no longer pending", body = ApiErrorResponse),
    ),
)]
pub async fn cancel_withdrawal(
    State(state): State<Arc<AppState>>,
    Path(withdrawal_id): Path<Uuid>,
) -> Result<Json<WithdrawalResponse>, LedgerError> {
    let cancelled = WithdrawalService::cancel(&state, withdrawal_id).await?;
    Ok(Json(WithdrawalResponse::from(cancelled)))
}
