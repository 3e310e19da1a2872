use axum::extract::{Json, State};
use onagui_core::app_state::AppState;
use onagui_core::services::transfer_service::TransferService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::{LedgerEntryDto, TransferRequest, TransferResponse};
use std::sync::Arc;
use validator::Validate;

/// Move funds between two user accounts.
///
/// The idempotency key makes retries safe: a replay of an already-applied
/// key returns the original result with `replayed: true` and moves no
/// funds. The sender's balance is checked atomically with the write, so
/// concurrent transfers cannot overdraw the account.
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer applied or replayed", body = TransferResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 402, description = "Insufficient funds", body = ApiErrorResponse),
        (status = 404, description = "Unknown sender or recipient", body = ApiErrorResponse),
        (status = 429, description = "Per-account rate limit exceeded", body = ApiErrorResponse),
    ),
)]
pub async fn transfer_funds(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, LedgerError> {
    req.validate()?;

    let receipt = TransferService::transfer(&state, req).await?;

    Ok(Json(TransferResponse {
        reference: receipt.reference,
        replayed: receipt.replayed,
        entries: receipt
            .entries
            .into_iter()
            .map(LedgerEntryDto::from)
            .collect(),
    }))
}
