use axum::extract::{Path, State};
use axum::Json;
use onagui_core::app_state::AppState;
use onagui_core::services::account_service::AccountService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::BalanceResponse;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/accounts/{user_id}/balance",
    tag = "Accounts",
    responses(
        (status = 200, description = "Current balance in minor units", body = BalanceResponse),
        (status = 404, description = "No account for this user", body = ApiErrorResponse),
    ),
)]
pub async fn get_user_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, LedgerError> {
    let balance = AccountService::balance(&state, user_id).await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}
