use crate::app_state::AppState;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{Account, LedgerEntry};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug)]
pub struct ReconciliationReport {
    pub account_id: Uuid,
    pub balance: i64,
    pub entry_sum: i64,
}

impl ReconciliationReport {
    pub fn consistent(&self) -> bool {
        self.balance == self.entry_sum
    }
}

pub struct AccountService;

impl AccountService {
    pub async fn open_account(state: &AppState, user_id: Uuid) -> Result<Account, LedgerError> {
        let account = state.store.open_account(user_id)?;
        info!(user_id = %user_id, account_id = %account.id, "Account ready");
        Ok(account)
    }

    pub async fn balance(state: &AppState, user_id: Uuid) -> Result<i64, LedgerError> {
        state.store.balance(user_id)
    }

    pub async fn entries(state: &AppState, user_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        let account = state.store.account_by_user(user_id)?;
        state.store.entries_for_account(account.id)
    }

    /// Recompute the entry sum and compare it to the stored balance. The two
    /// must always agree; a mismatch means the store broke its atomicity
    /// contract and is worth an alert, not a silent fix.
    pub async fn reconcile(
        state: &AppState,
        user_id: Uuid,
    ) -> Result<ReconciliationReport, LedgerError> {
        let account = state.store.account_by_user(user_id)?;
        let entries = state.store.entries_for_account(account.id)?;
        let entry_sum: i64 = entries.iter().map(|entry| entry.delta).sum();

        let report = ReconciliationReport {
            account_id: account.id,
            balance: account.balance,
            entry_sum,
        };

        if !report.consistent() {
            error!(
                account_id = %account.id,
                balance = account.balance,
                entry_sum,
                "Ledger reconciliation mismatch"
            );
        }

        Ok(report)
    }
}
