use crate::models::entities::enum_types::EntryKind;
use crate::models::entities::ledger_entry::LedgerEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenAccountRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpenAccountResponse {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    /// Minor units.
    pub balance: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerEntryDto {
    pub id: Uuid,
    pub account_id: Uuid,
    pub delta: i64,
    pub kind: EntryKind,
    pub counterparty_account_id: Option<Uuid>,
    pub external_tx_hash: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryDto {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            delta: entry.delta,
            kind: entry.kind,
            counterparty_account_id: entry.counterparty_account_id,
            external_tx_hash: entry.external_tx_hash,
            idempotency_key: entry.idempotency_key,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntriesResponse {
    pub entries: Vec<LedgerEntryDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub entry_sum: i64,
    pub consistent: bool,
}
