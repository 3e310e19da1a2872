use axum::extract::{Path, State};
use axum::Json;
use onagui_core::app_state::AppState;
use onagui_core::services::account_service::AccountService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::ReconciliationResponse;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/accounts/{user_id}/reconciliation",
    tag = "Accounts",
    responses(
        (status = 200, description = "Stored balance vs recomputed entry sum", body = ReconciliationResponse),
        (status = 404, description = "No account for this user", body = ApiErrorResponse),
    ),
)]
pub async fn get_reconciliation(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ReconciliationResponse>, LedgerError> {
    let report = AccountService::reconcile(&state, user_id).await?;

    Ok(Json(ReconciliationResponse {
        user_id,
        balance: report.balance,
        entry_sum: report.entry_sum,
        consistent: report.consistent(),
    }))
}
