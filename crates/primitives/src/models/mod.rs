pub mod app_config;
pub mod dtos;
pub mod entities;

pub use app_config::AppConfig;
pub use dtos::account_dto::{
    BalanceResponse, EntriesResponse, LedgerEntryDto, OpenAccountRequest, OpenAccountResponse,
    ReconciliationResponse,
};
pub use dtos::deposit_dto::{DepositRequest, DepositResponse};
pub use dtos::transfer_dto::{TransferRequest, TransferResponse};
pub use dtos::withdrawal_dto::{WithdrawRequest, WithdrawalResponse};
pub use entities::account::{Account, NewAccount};
pub use entities::enum_types::{EntryKind, WithdrawalStatus};
pub use entities::ledger_entry::{LedgerEntry, NewLedgerEntry};
pub use entities::withdrawal::{NewWithdrawal, Withdrawal};
