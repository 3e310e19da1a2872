use axum::extract::{Path, State};
use axum::Json;
use onagui_core::app_state::AppState;
use onagui_core::services::account_service::AccountService;
use onagui_primitives::error::{ApiErrorResponse, LedgerError};
use onagui_primitives::models::{EntriesResponse, LedgerEntryDto};
use std::sync::Arc;
use uuid::Uuid;

/// Full entry history for an account, oldest first. Entries are immutable,
/// so this is the audit trail behind the balance.
#[utoipa::path(
    get,
    path = "/api/accounts/{user_id}/entries",
    tag = "Accounts",
    responses(
        (status = 200, description = "Ledger entries, oldest first", body = EntriesResponse),
        (status = 404, description = "No account for this user", body = ApiErrorResponse),
    ),
)]
pub async fn get_account_entries(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<EntriesResponse>, LedgerError> {
    let entries = AccountService::entries(&state, user_id).await?;

    Ok(Json(EntriesResponse {
        entries: entries.into_iter().map(LedgerEntryDto::from).collect(),
    }))
}
