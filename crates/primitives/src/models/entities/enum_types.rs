use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum, Display, EnumString,
    ToSchema,
)]
#[ExistingTypePath = "crate::schema::sql_types::EntryKind"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    TransferDebit,
    TransferCredit,
    Deposit,
    Withdrawal,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum, Display, EnumString,
    ToSchema,
)]
#[ExistingTypePath = "crate::schema::sql_types::WithdrawalStatus"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl WithdrawalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::Completed | WithdrawalStatus::Failed | WithdrawalStatus::Cancelled
        )
    }

    /// Legal state machine edges. Nothing skips `Processing` on the way to
    /// a settled outcome, and terminal states never move again.
    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        matches!(
            (self, next),
            (WithdrawalStatus::Pending, WithdrawalStatus::Processing)
                | (WithdrawalStatus::Pending, WithdrawalStatus::Cancelled)
                | (WithdrawalStatus::Processing, WithdrawalStatus::Completed)
                | (WithdrawalStatus::Processing, WithdrawalStatus::Failed)
        )
    }
}
