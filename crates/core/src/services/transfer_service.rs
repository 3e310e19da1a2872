use crate::app_state::AppState;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{EntryKind, LedgerEntry, NewLedgerEntry, TransferRequest};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct TransferReceipt {
    /// Id of the debit entry; stable across replays of the same key.
    pub reference: Uuid,
    pub replayed: bool,
    pub entries: Vec<LedgerEntry>,
}

pub struct TransferService;

impl TransferService {
    /// Move funds between two user accounts as one idempotent operation.
    ///
    /// Exactly one debit and one credit entry exist per logical transfer no
    /// matter how often the key is replayed; sufficiency is checked inside
    /// the store's critical section, so concurrent transfers cannot
    /// overdraw a stale balance.
    pub async fn transfer(
        state: &AppState,
        req: TransferRequest,
    ) -> Result<TransferReceipt, LedgerError> {
        if req.amount <= 0 {
            return Err(LedgerError::InvalidRequest(
                "transfer amount must be positive".into(),
            ));
        }
        if req.from_user_id == req.to_user_id {
            return Err(LedgerError::InvalidRequest(
                "sender and recipient must differ".into(),
            ));
        }

        if let Some(receipt) = Self::recorded_result(state, &req.idempotency_key)? {
            info!(
                idempotency_key = %req.idempotency_key,
                reference = %receipt.reference,
                "Replayed transfer, returning recorded result"
            );
            return Ok(receipt);
        }

        if !state.limiter.check_and_record(req.from_user_id) {
            warn!(from_user_id = %req.from_user_id, "Transfer rate limit hit");
            return Err(LedgerError::RateLimited);
        }

        let from = state.store.account_by_user(req.from_user_id)?;
        let to = state.store.account_by_user(req.to_user_id)?;

        let metadata = match &req.description {
            Some(description) => json!({ "description": description }),
            None => json!({}),
        };

        let entries = [
            NewLedgerEntry {
                account_id: from.id,
                delta: -req.amount,
                kind: EntryKind::TransferDebit,
                counterparty_account_id: Some(to.id),
                external_tx_hash: None,
                idempotency_key: Some(req.idempotency_key.clone()),
                metadata: metadata.clone(),
            },
            NewLedgerEntry {
                account_id: to.id,
                delta: req.amount,
                kind: EntryKind::TransferCredit,
                counterparty_account_id: Some(from.id),
                external_tx_hash: None,
                idempotency_key: Some(req.idempotency_key.clone()),
                metadata,
            },
        ];

        match state.store.apply_entries(&entries) {
            Ok(applied) => {
                let reference = applied
                    .iter()
                    .find(|entry| entry.kind == EntryKind::TransferDebit)
                    .map(|entry| entry.id)
                    .ok_or_else(|| LedgerError::Internal("debit entry missing".into()))?;
                info!(
                    reference = %reference,
                    from_user_id = %req.from_user_id,
                    to_user_id = %req.to_user_id,
                    amount = req.amount,
                    "Transfer completed"
                );
                Ok(TransferReceipt {
                    reference,
                    replayed: false,
                    entries: applied,
                })
            }
            // Lost a same-key race: the winner's pair is this request's result.
            Err(LedgerError::DuplicateEntry { .. }) => {
                Self::recorded_result(state, &req.idempotency_key)?.ok_or_else(|| {
                    LedgerError::Conflict("transfer record missing after key collision".into())
                })
            }
            Err(e) => Err(e),
        }
    }

    fn recorded_result(
        state: &AppState,
        idempotency_key: &str,
    ) -> Result<Option<TransferReceipt>, LedgerError> {
        let entries: Vec<LedgerEntry> = state
            .store
            .entries_by_idempotency_key(idempotency_key)?
            .into_iter()
            .filter(|entry| {
                matches!(
                    entry.kind,
                    EntryKind::TransferDebit | EntryKind::TransferCredit
                )
            })
            .collect();

        let Some(debit) = entries
            .iter()
            .find(|entry| entry.kind == EntryKind::TransferDebit)
        else {
            return Ok(None);
        };

        Ok(Some(TransferReceipt {
            reference: debit.id,
            replayed: true,
            entries,
        }))
    }
}
