use crate::models::dtos::account_dto::LedgerEntryDto;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct TransferRequest {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    /// Minor units, must be positive.
    #[validate(range(min = 1))]
    pub amount: i64,
    /// Client-supplied, unique per logical transfer. Replays with the same
    /// key return the original result.
    #[validate(length(min = 8, max = 128))]
    pub idempotency_key: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    /// Id of the debit entry; stable across replays.
    pub reference: Uuid,
    pub replayed: bool,
    pub entries: Vec<LedgerEntryDto>,
}
