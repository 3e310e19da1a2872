use axum::extract::{Json, State};
use onagui_core::services::account_service::AccountService;
use onagui_core::app_state::AppState;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{OpenAccountRequest, OpenAccountResponse};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "Accounts",
    request_body = OpenAccountRequest,
    responses(
        (status = 200, description = "Account ready (idempotent)", body = OpenAccountResponse),
    ),
)]
pub async fn open_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenAccountRequest>,
) -> Result<Json<OpenAccountResponse>, LedgerError> {
    let account = AccountService::open_account(&state, req.user_id).await?;

    Ok(Json(OpenAccountResponse {
        account_id: account.id,
        user_id: account.user_id,
        balance: account.balance,
    }))
}
