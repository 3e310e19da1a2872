use crate::models::entities::enum_types::WithdrawalStatus;
use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = crate::schema::withdrawals)]
#[diesel(belongs_to(crate::models::entities::account::Account))]
pub struct Withdrawal {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub to_address: String,
    pub status: WithdrawalStatus,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::withdrawals)]
pub struct NewWithdrawal {
    pub account_id: Uuid,
    pub amount: i64,
    pub to_address: String,
}
