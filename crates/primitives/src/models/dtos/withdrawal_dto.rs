use crate::models::entities::enum_types::WithdrawalStatus;
use crate::models::entities::withdrawal::Withdrawal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct WithdrawRequest {
    pub user_id: Uuid,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(length(min = 1, max = 256))]
    pub to_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub to_address: String,
    pub status: WithdrawalStatus,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self {
            id: w.id,
            account_id: w.account_id,
            amount: w.amount,
            to_address: w.to_address,
            status: w.status,
            tx_hash: w.tx_hash,
            created_at: w.created_at,
            processed_at: w.processed_at,
        }
    }
}
