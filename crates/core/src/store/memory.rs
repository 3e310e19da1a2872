use crate::store::LedgerStore;
use chrono::Utc;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{
    Account, EntryKind, LedgerEntry, NewLedgerEntry, NewWithdrawal, Withdrawal, WithdrawalStatus,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    accounts_by_user: HashMap<Uuid, Uuid>,
    entries: Vec<LedgerEntry>,
    idempotency_keys: HashSet<(String, EntryKind)>,
    deposit_hashes: HashSet<String>,
    withdrawals: HashMap<Uuid, Withdrawal>,
}

/// In-process store for tests and local runs. A single mutex linearizes
/// every mutation, which trivially satisfies the per-account serialization
/// the trait demands; the invariants match the Postgres store exactly.
#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn open_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let mut inner = self.lock();
        if let Some(account_id) = inner.accounts_by_user.get(&user_id) {
            let account_id = *account_id;
            return Ok(inner.accounts[&account_id].clone());
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            balance: 0,
            created_at: now,
            updated_at: now,
        };
        inner.accounts_by_user.insert(user_id, account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn account_by_user(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let inner = self.lock();
        inner
            .accounts_by_user
            .get(&user_id)
            .and_then(|id| inner.accounts.get(id))
            .cloned()
            .ok_or(LedgerError::AccountNotFound(user_id))
    }

    fn account(&self, account_id: Uuid) -> Result<Account, LedgerError> {
        self.lock()
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    fn balance(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        Ok(self.account_by_user(user_id)?.balance)
    }

    fn apply_entries(&self, entries: &[NewLedgerEntry]) -> Result<Vec<LedgerEntry>, LedgerError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut inner = self.lock();

        // Validate the whole batch before touching any state, mirroring the
        // all-or-nothing transaction of the Postgres store.
        let mut balances: HashMap<Uuid, i64> = HashMap::new();
        for entry in entries {
            let account = inner
                .accounts
                .get(&entry.account_id)
                .ok_or(LedgerError::AccountNotFound(entry.account_id))?;
            balances.entry(entry.account_id).or_insert(account.balance);
        }

        for entry in entries {
            if let Some(key) = &entry.idempotency_key {
                if inner
                    .idempotency_keys
                    .contains(&(key.clone(), entry.kind))
                {
                    return Err(LedgerError::DuplicateEntry {
                        idempotency_key: key.clone(),
                    });
                }
            }
            if entry.kind == EntryKind::Deposit {
                if let Some(tx_hash) = &entry.external_tx_hash {
                    if inner.deposit_hashes.contains(tx_hash) {
                        return Err(LedgerError::DuplicateDeposit {
                            tx_hash: tx_hash.clone(),
                        });
                    }
                }
            }

            let balance = balances
                .get_mut(&entry.account_id)
                .ok_or_else(|| LedgerError::Internal("account missing from batch".into()))?;
            let available = *balance;
            *balance += entry.delta;
            if *balance < 0 {
                return Err(LedgerError::InsufficientFunds {
                    account_id: entry.account_id,
                    requested: -entry.delta,
                    available,
                });
            }
        }

        let now = Utc::now();
        let mut applied = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = LedgerEntry {
                id: Uuid::new_v4(),
                account_id: entry.account_id,
                delta: entry.delta,
                kind: entry.kind,
                counterparty_account_id: entry.counterparty_account_id,
                external_tx_hash: entry.external_tx_hash.clone(),
                idempotency_key: entry.idempotency_key.clone(),
                metadata: entry.metadata.clone(),
                created_at: now,
            };
            if let Some(key) = &record.idempotency_key {
                inner.idempotency_keys.insert((key.clone(), record.kind));
            }
            if record.kind == EntryKind::Deposit {
                if let Some(tx_hash) = &record.external_tx_hash {
                    inner.deposit_hashes.insert(tx_hash.clone());
                }
            }
            inner.entries.push(record.clone());
            applied.push(record);
        }

        for (account_id, balance) in balances {
            if let Some(account) = inner.accounts.get_mut(&account_id) {
                account.balance = balance;
                account.updated_at = now;
            }
        }

        Ok(applied)
    }

    fn entries_for_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect())
    }

    fn entries_by_idempotency_key(&self, key: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.idempotency_key.as_deref() == Some(key))
            .cloned()
            .collect())
    }

    fn deposit_by_tx_hash(&self, tx_hash: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .find(|entry| {
                entry.kind == EntryKind::Deposit
                    && entry.external_tx_hash.as_deref() == Some(tx_hash)
            })
            .cloned())
    }

    fn create_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let mut inner = self.lock();
        let now = Utc::now();
        let record = Withdrawal {
            id: Uuid::new_v4(),
            account_id: withdrawal.account_id,
            amount: withdrawal.amount,
            to_address: withdrawal.to_address,
            status: WithdrawalStatus::Pending,
            tx_hash: None,
            created_at: now,
            processed_at: None,
            updated_at: now,
        };
        inner.withdrawals.insert(record.id, record.clone());
        Ok(record)
    }

    fn withdrawal(&self, id: Uuid) -> Result<Withdrawal, LedgerError> {
        self.lock()
            .withdrawals
            .get(&id)
            .cloned()
            .ok_or(LedgerError::WithdrawalNotFound(id))
    }

    fn withdrawals_in_status(
        &self,
        status: WithdrawalStatus,
    ) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut matching: Vec<Withdrawal> = self
            .lock()
            .withdrawals
            .values()
            .filter(|w| w.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|w| w.created_at);
        Ok(matching)
    }

    fn transition_withdrawal(
        &self,
        id: Uuid,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    ) -> Result<Withdrawal, LedgerError> {
        if !from.can_transition_to(to) {
            return Err(LedgerError::Conflict(format!(
                "illegal withdrawal transition {} -> {}",
                from, to
            )));
        }

        let mut inner = self.lock();
        let record = inner
            .withdrawals
            .get_mut(&id)
            .ok_or(LedgerError::WithdrawalNotFound(id))?;

        if record.status != from {
            return Err(LedgerError::Conflict(format!(
                "withdrawal {} is no longer {}",
                id, from
            )));
        }

        let now = Utc::now();
        record.status = to;
        record.updated_at = now;
        if matches!(to, WithdrawalStatus::Completed | WithdrawalStatus::Failed) {
            record.processed_at = Some(now);
        }
        Ok(record.clone())
    }

    fn set_withdrawal_tx_hash(&self, id: Uuid, tx_hash: &str) -> Result<Withdrawal, LedgerError> {
        let mut inner = self.lock();
        let record = inner
            .withdrawals
            .get_mut(&id)
            .ok_or(LedgerError::WithdrawalNotFound(id))?;
        record.tx_hash = Some(tx_hash.to_string());
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
