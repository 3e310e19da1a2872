use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A confirmed on-chain deposit observed by the chain watcher. The watcher
/// only forwards transactions past the confirmation threshold.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct DepositRequest {
    pub user_id: Uuid,
    #[validate(range(min = 1))]
    pub amount: i64,
    #[validate(length(min = 1, max = 128))]
    pub tx_hash: String,
    #[validate(length(min = 1, max = 256))]
    pub from_address: String,
    #[validate(length(min = 1, max = 256))]
    pub to_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    pub entry_id: Uuid,
}
