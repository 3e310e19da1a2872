use crate::app_state::AppState;
use crate::clients::chain::{ChainSubmitError, ChainTxState};
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{
    EntryKind, NewLedgerEntry, NewWithdrawal, WithdrawRequest, Withdrawal, WithdrawalStatus,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Keeps two in-process drivers off the same withdrawal. Every persistent
/// step below is idempotent on its own (reserve by entry key, broadcast by
/// recorded hash, transitions by CAS); the guard just avoids wasted chain
/// calls when the poller and an operator collide.
#[derive(Default)]
pub struct DriveGuard {
    in_flight: Mutex<HashSet<Uuid>>,
}

impl DriveGuard {
    fn acquire(&self, id: Uuid) -> Option<DriveToken<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(id) {
            return None;
        }
        Some(DriveToken { guard: self, id })
    }
}

struct DriveToken<'a> {
    guard: &'a DriveGuard,
    id: Uuid,
}

impl Drop for DriveToken<'_> {
    fn drop(&mut self) {
        self.guard
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

pub struct WithdrawalService;

impl WithdrawalService {
    pub async fn request(
        state: &AppState,
        req: WithdrawRequest,
    ) -> Result<Withdrawal, LedgerError> {
        if req.amount <= 0 {
            return Err(LedgerError::InvalidRequest(
                "withdrawal amount must be positive".into(),
            ));
        }
        if req.to_address.trim().is_empty() {
            return Err(LedgerError::InvalidRequest(
                "withdrawal address must not be empty".into(),
            ));
        }

        let account = state.store.account_by_user(req.user_id)?;

        // Courtesy check only; the authoritative check happens when the
        // reserve debit is applied.
        if account.balance < req.amount {
            return Err(LedgerError::InsufficientFunds {
                account_id: account.id,
                requested: req.amount,
                available: account.balance,
            });
        }

        let withdrawal = state.store.create_withdrawal(NewWithdrawal {
            account_id: account.id,
            amount: req.amount,
            to_address: req.to_address,
        })?;

        info!(
            withdrawal_id = %withdrawal.id,
            user_id = %req.user_id,
            amount = req.amount,
            "Withdrawal requested"
        );

        Ok(withdrawal)
    }

    pub async fn cancel(state: &AppState, id: Uuid) -> Result<Withdrawal, LedgerError> {
        let cancelled = state.store.transition_withdrawal(
            id,
            WithdrawalStatus::Pending,
            WithdrawalStatus::Cancelled,
        )?;
        info!(withdrawal_id = %id, "Withdrawal cancelled");
        Ok(cancelled)
    }

    /// Drive one withdrawal towards a terminal state. Safe to call again
    /// after any crash: the reserve debit dedupes on its entry key, the
    /// broadcast dedupes on the recorded hash, and terminal transitions
    /// CAS on status. A withdrawal is never failed on a timeout alone —
    /// without a definitive chain answer it stays `processing`.
    pub async fn process(state: &AppState, id: Uuid) -> Result<Withdrawal, LedgerError> {
        let _token = state
            .withdrawal_guard
            .acquire(id)
            .ok_or_else(|| LedgerError::Conflict(format!("withdrawal {} is being driven", id)))?;

        let current = state.store.withdrawal(id)?;
        let withdrawal = match current.status {
            WithdrawalStatus::Pending => state.store.transition_withdrawal(
                id,
                WithdrawalStatus::Pending,
                WithdrawalStatus::Processing,
            )?,
            WithdrawalStatus::Processing => current,
            _ => return Ok(current),
        };

        // Reserve the funds before touching the chain, so the same balance
        // cannot be withdrawn twice even when the node is slow.
        let reserve = NewLedgerEntry {
            account_id: withdrawal.account_id,
            delta: -withdrawal.amount,
            kind: EntryKind::Withdrawal,
            counterparty_account_id: None,
            external_tx_hash: None,
            idempotency_key: Some(format!("withdrawal:{}", id)),
            metadata: json!({ "to_address": withdrawal.to_address }),
        };

        match state.store.apply_entries(std::slice::from_ref(&reserve)) {
            Ok(_) => {}
            // An earlier drive already reserved; keep going.
            Err(LedgerError::DuplicateEntry { .. }) => {}
            Err(LedgerError::InsufficientFunds { .. }) => {
                // Nothing was debited, so failing needs no reversal.
                warn!(withdrawal_id = %id, "Withdrawal failed: insufficient funds at reserve");
                return state.store.transition_withdrawal(
                    id,
                    WithdrawalStatus::Processing,
                    WithdrawalStatus::Failed,
                );
            }
            Err(e) => return Err(e),
        }

        let tx_hash = match &withdrawal.tx_hash {
            Some(hash) => hash.clone(),
            None => {
                match state
                    .chain
                    .submit_transfer(&withdrawal.to_address, withdrawal.amount, &id.to_string())
                    .await
                {
                    Ok(hash) => {
                        state.store.set_withdrawal_tx_hash(id, &hash)?;
                        info!(withdrawal_id = %id, tx_hash = %hash, "Withdrawal broadcast");
                        hash
                    }
                    Err(ChainSubmitError::Rejected(msg)) => {
                        // Never reached the chain; reverse the reserve.
                        warn!(withdrawal_id = %id, "Withdrawal rejected by chain: {}", msg);
                        Self::reverse(state, &withdrawal)?;
                        return state.store.transition_withdrawal(
                            id,
                            WithdrawalStatus::Processing,
                            WithdrawalStatus::Failed,
                        );
                    }
                    Err(ChainSubmitError::Unavailable(msg)) => {
                        // Outcome unknown; stay processing, the poller retries.
                        warn!(withdrawal_id = %id, "Chain unavailable, will retry: {}", msg);
                        return Err(LedgerError::Chain(msg));
                    }
                }
            }
        };

        let tx = state.chain.transaction(&tx_hash).await?;
        match tx.state {
            ChainTxState::Confirmed if tx.confirmations >= state.config.chain_min_confirmations => {
                info!(
                    withdrawal_id = %id,
                    tx_hash = %tx_hash,
                    confirmations = tx.confirmations,
                    "Withdrawal completed"
                );
                state.store.transition_withdrawal(
                    id,
                    WithdrawalStatus::Processing,
                    WithdrawalStatus::Completed,
                )
            }
            ChainTxState::Failed => {
                warn!(withdrawal_id = %id, tx_hash = %tx_hash, "On-chain transfer failed, reversing");
                Self::reverse(state, &withdrawal)?;
                state.store.transition_withdrawal(
                    id,
                    WithdrawalStatus::Processing,
                    WithdrawalStatus::Failed,
                )
            }
            _ => {
                debug!(
                    withdrawal_id = %id,
                    tx_hash = %tx_hash,
                    confirmations = tx.confirmations,
                    "Awaiting confirmations"
                );
                state.store.withdrawal(id)
            }
        }
    }

    /// Compensating credit for a reserved amount whose payout did not
    /// happen. An explicit entry, never a silent balance edit, so every
    /// reversal stays auditable. Idempotent per withdrawal.
    fn reverse(state: &AppState, withdrawal: &Withdrawal) -> Result<(), LedgerError> {
        let reversal = NewLedgerEntry {
            account_id: withdrawal.account_id,
            delta: withdrawal.amount,
            kind: EntryKind::Deposit,
            counterparty_account_id: None,
            external_tx_hash: None,
            idempotency_key: Some(format!("reversal:withdrawal:{}", withdrawal.id)),
            metadata: json!({
                "withdrawal_id": withdrawal.id,
                "reason": "withdrawal reversal",
            }),
        };

        match state.store.apply_entries(std::slice::from_ref(&reversal)) {
            Ok(_) | Err(LedgerError::DuplicateEntry { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
