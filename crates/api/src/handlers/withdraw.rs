use axum::extract::{Json, State};
use onagui_core::app_state::AppState;
use onagui_core::services::withdrawal_service::WithdrawalService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::{WithdrawRequest, WithdrawalResponse};
use std::sync::Arc;
use tokio::task;
use tracing::error;
use validator::Validate;

/// Request a withdrawal to an external address.
///
/// The request is accepted as `pending` and driven asynchronously: funds
/// are reserved with a ledger debit before anything is broadcast, and if
/// the on-chain transfer is rejected or fails the reserve is reversed with
/// a compensating entry. Poll `GET /api/withdrawals/{id}` for the outcome.
#[utoipa::path(
    post,
    path = "/api/withdrawals",
    tag = "Withdrawals",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal accepted as pending", body = WithdrawalResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 402, description = "Insufficient funds", body = ApiErrorResponse),
        (status = 404, description = "Unknown user", body = ApiErrorResponse),
    ),
)]
pub async fn request_withdrawal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawalResponse>, LedgerError> {
    req.validate()?;

    let withdrawal = WithdrawalService::request(&state, req).await?;

    // First drive attempt happens off the request path; the poller picks
    // up anything this attempt leaves unfinished.
    let drive_state = Arc::clone(&state);
    let withdrawal_id = withdrawal.id;
    task::spawn(async move {
        if let Err(e) = WithdrawalService::process(&drive_state, withdrawal_id).await {
            error!(withdrawal_id = %withdrawal_id, "Initial withdrawal drive failed: {}", e);
        }
    });

    Ok(Json(WithdrawalResponse::from(withdrawal)))
}
