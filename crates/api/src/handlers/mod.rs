pub mod account_entries;
pub mod cancel_withdrawal;
pub mod deposit;
pub mod get_balance;
pub mod get_withdrawal;
pub mod health;
pub mod open_account;
pub mod reconciliation;
pub mod transfer;
pub mod withdraw;
