pub mod account;
pub mod enum_types;
pub mod ledger_entry;
pub mod withdrawal;
