use crate::app_state::AppState;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{DepositRequest, EntryKind, LedgerEntry, NewLedgerEntry};
use serde_json::json;
use tracing::info;

pub struct DepositService;

impl DepositService {
    /// Credit a confirmed on-chain deposit exactly once, keyed by its
    /// transaction hash. Re-submissions of the same hash fail with
    /// `DuplicateDeposit` and never move the balance again.
    pub async fn process_deposit(
        state: &AppState,
        req: DepositRequest,
    ) -> Result<LedgerEntry, LedgerError> {
        if req.amount <= 0 {
            return Err(LedgerError::InvalidRequest(
                "deposit amount must be positive".into(),
            ));
        }
        if req.tx_hash.trim().is_empty() {
            return Err(LedgerError::InvalidRequest(
                "deposit transaction hash must not be empty".into(),
            ));
        }

        if state.store.deposit_by_tx_hash(&req.tx_hash)?.is_some() {
            return Err(LedgerError::DuplicateDeposit {
                tx_hash: req.tx_hash,
            });
        }

        let account = state.store.account_by_user(req.user_id)?;

        let entry = NewLedgerEntry {
            account_id: account.id,
            delta: req.amount,
            kind: EntryKind::Deposit,
            counterparty_account_id: None,
            external_tx_hash: Some(req.tx_hash.clone()),
            idempotency_key: None,
            metadata: json!({
                "from_address": req.from_address,
                "to_address": req.to_address,
            }),
        };

        // The unique index on the hash closes the race between the lookup
        // above and this write.
        let applied = state.store.apply_entries(std::slice::from_ref(&entry))?;
        let entry = applied
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::Internal("deposit entry missing".into()))?;

        info!(
            user_id = %req.user_id,
            tx_hash = %req.tx_hash,
            amount = req.amount,
            "Deposit credited"
        );

        Ok(entry)
    }
}
