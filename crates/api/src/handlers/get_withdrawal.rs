use axum::extract::{Path, State};
use axum::Json;
use onagui_core::app_state::AppState;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::WithdrawalResponse;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/withdrawals/{withdrawal_id}",
    tag = "Withdrawals",
    responses(
        (status = 200, description = "Current withdrawal state", body = WithdrawalResponse),
        (status = 404, description = "Unknown withdrawal", body = ApiErrorResponse),
    ),
)]
pub async fn get_withdrawal(
    State(state): State<Arc<AppState>>,
    Path(withdrawal_id): Path<Uuid>,
) -> Result<Json<WithdrawalResponse>, LedgerError> {
    let withdrawal = state.store.withdrawal(withdrawal_id)?;
    Ok(Json(WithdrawalResponse::from(withdrawal)))
}
