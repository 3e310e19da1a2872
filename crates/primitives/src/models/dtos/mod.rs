pub mod account_dto;
pub mod deposit_dto;
pub mod transfer_dto;
pub mod withdrawal_dto;
