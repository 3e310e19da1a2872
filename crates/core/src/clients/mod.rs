pub mod chain;

pub use chain::{ChainClient, ChainSubmitError, ChainTransaction, ChainTxState};
