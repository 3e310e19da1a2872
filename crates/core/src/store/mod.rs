use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{
    Account, LedgerEntry, NewLedgerEntry, NewWithdrawal, Withdrawal, WithdrawalStatus,
};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Durable record of balances and entries. `apply_entries` is the only
/// mutation path for money: it persists a batch of entries and the matching
/// balance updates as one atomic unit, serializing concurrent writers per
/// account. There is never a balance update without its entry, nor an entry
/// the balance does not reflect.
pub trait LedgerStore: Send + Sync {
    /// Idempotent: returns the existing account when the user already has one.
    fn open_account(&self, user_id: Uuid) -> Result<Account, LedgerError>;

    fn account_by_user(&self, user_id: Uuid) -> Result<Account, LedgerError>;

    fn account(&self, account_id: Uuid) -> Result<Account, LedgerError>;

    fn balance(&self, user_id: Uuid) -> Result<i64, LedgerError>;

    /// Atomically persist `entries` and apply their deltas.
    ///
    /// Fails with `InsufficientFunds` if any resulting balance would go
    /// negative, `DuplicateEntry` on an (idempotency_key, kind) collision,
    /// `DuplicateDeposit` on an external tx hash collision, and `Conflict`
    /// on serialization contention. On any failure nothing is persisted.
    fn apply_entries(&self, entries: &[NewLedgerEntry]) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn entries_for_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn entries_by_idempotency_key(&self, key: &str) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn deposit_by_tx_hash(&self, tx_hash: &str) -> Result<Option<LedgerEntry>, LedgerError>;

    fn create_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;

    fn withdrawal(&self, id: Uuid) -> Result<Withdrawal, LedgerError>;

    fn withdrawals_in_status(
        &self,
        status: WithdrawalStatus,
    ) -> Result<Vec<Withdrawal>, LedgerError>;

    /// Compare-and-swap on withdrawal status. Fails with `Conflict` when the
    /// observed status is not `from`, or when the edge is not a legal
    /// transition. Terminal settlement stamps `processed_at`.
    fn transition_withdrawal(
        &self,
        id: Uuid,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    ) -> Result<Withdrawal, LedgerError>;

    /// Records the broadcast hash. Written once, right after submission and
    /// before the outcome is known, so a crashed processor never rebroadcasts.
    fn set_withdrawal_tx_hash(&self, id: Uuid, tx_hash: &str) -> Result<Withdrawal, LedgerError>;

    /// Cheap liveness probe for the health endpoint.
    fn ping(&self) -> Result<(), LedgerError>;
}
