pub mod account_service;
pub mod deposit_service;
pub mod rate_limiter;
pub mod transfer_service;
pub mod withdrawal_service;

pub use account_service::AccountService;
pub use deposit_service::DepositService;
pub use rate_limiter::TransferRateLimiter;
pub use transfer_service::TransferService;
pub use withdrawal_service::WithdrawalService;
