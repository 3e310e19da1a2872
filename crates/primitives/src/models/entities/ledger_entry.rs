use crate::models::entities::enum_types::EntryKind;
use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Immutable append-only record of a single balance movement. An account's
/// balance is always the sum of its entries.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = crate::schema::ledger_entries)]
#[diesel(belongs_to(crate::models::entities::account::Account))]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub delta: i64,
    pub kind: EntryKind,
    pub counterparty_account_id: Option<Uuid>,
    pub external_tx_hash: Option<String>,
    pub idempotency_key: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::ledger_entries)]
pub struct NewLedgerEntry {
    pub account_id: Uuid,
    pub delta: i64,
    pub kind: EntryKind,
    pub counterparty_account_id: Option<Uuid>,
    pub external_tx_hash: Option<String>,
    pub idempotency_key: Option<String>,
    pub metadata: Value,
}
