use crate::store::LedgerStore;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::PgConnection;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{
    Account, EntryKind, LedgerEntry, NewAccount, NewLedgerEntry, NewWithdrawal, Withdrawal,
    WithdrawalStatus,
};
use onagui_primitives::schema::{accounts, ledger_entries, withdrawals};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Production store: one diesel transaction per `apply_entries`, with
/// `FOR UPDATE` row locks taken in ascending account-id order so crossing
/// transfers cannot deadlock. Idempotency and deposit dedup ride on unique
/// indexes, so they hold across processes and restarts.
pub struct PgLedgerStore {
    pool: DbPool,
}

impl PgLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, LedgerError> {
        self.pool
            .get()
            .map_err(|e| LedgerError::DatabaseConnection(e.to_string()))
    }
}

fn map_entry_insert_error(e: diesel::result::Error, entries: &[NewLedgerEntry]) -> LedgerError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if info.constraint_name() == Some("ledger_entries_external_tx_hash_idx") =>
        {
            LedgerError::DuplicateDeposit {
                tx_hash: entries
                    .iter()
                    .find_map(|entry| entry.external_tx_hash.clone())
                    .unwrap_or_default(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            LedgerError::DuplicateEntry {
                idempotency_key: entries
                    .iter()
                    .find_map(|entry| entry.idempotency_key.clone())
                    .unwrap_or_default(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            LedgerError::Conflict("concurrent ledger write, retry".into())
        }
        other => LedgerError::Database(other),
    }
}

impl LedgerStore for PgLedgerStore {
    fn open_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let mut conn = self.conn()?;

        diesel::insert_into(accounts::table)
            .values(&NewAccount { user_id })
            .on_conflict(accounts::user_id)
            .do_nothing()
            .execute(&mut conn)?;

        accounts::table
            .filter(accounts::user_id.eq(user_id))
            .first::<Account>(&mut conn)
            .map_err(LedgerError::from)
    }

    fn account_by_user(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let mut conn = self.conn()?;
        accounts::table
            .filter(accounts::user_id.eq(user_id))
            .first::<Account>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => LedgerError::AccountNotFound(user_id),
                other => LedgerError::Database(other),
            })
    }

    fn account(&self, account_id: Uuid) -> Result<Account, LedgerError> {
        let mut conn = self.conn()?;
        accounts::table
            .filter(accounts::id.eq(account_id))
            .first::<Account>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => LedgerError::AccountNotFound(account_id),
                other => LedgerError::Database(other),
            })
    }

    fn balance(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        Ok(self.account_by_user(user_id)?.balance)
    }

    fn apply_entries(&self, entries: &[NewLedgerEntry]) -> Result<Vec<LedgerEntry>, LedgerError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;

        conn.transaction::<Vec<LedgerEntry>, LedgerError, _>(|conn| {
            // BTreeMap keeps the lock order ascending by account id.
            let mut balances: BTreeMap<Uuid, i64> = BTreeMap::new();
            for entry in entries {
                balances.entry(entry.account_id).or_insert(0);
            }

            for (account_id, balance) in balances.iter_mut() {
                let account = accounts::table
                    .filter(accounts::id.eq(account_id))
                    .for_update()
                    .first::<Account>(conn)
                    .map_err(|e| match e {
                        diesel::result::Error::NotFound => {
                            LedgerError::AccountNotFound(*account_id)
                        }
                        other => LedgerError::Database(other),
                    })?;
                *balance = account.balance;
            }

            for entry in entries {
                let balance = balances
                    .get_mut(&entry.account_id)
                    .ok_or_else(|| LedgerError::Internal("unlocked account in batch".into()))?;
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

            let inserted = diesel::insert_into(ledger_entries::table)
                .values(entries)
                .get_results::<LedgerEntry>(conn)
                .map_err(|e| map_entry_insert_error(e, entries))?;

            for (account_id, balance) in &balances {
                diesel::update(accounts::table.filter(accounts::id.eq(account_id)))
                    .set((
                        accounts::balance.eq(balance),
                        accounts::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)?;
            }

            Ok(inserted)
        })
    }

    fn entries_for_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.conn()?;
        ledger_entries::table
            .filter(ledger_entries::account_id.eq(account_id))
            .order(ledger_entries::created_at.asc())
            .load::<LedgerEntry>(&mut conn)
            .map_err(LedgerError::from)
    }

    fn entries_by_idempotency_key(&self, key: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut conn = self.conn()?;
        ledger_entries::table
            .filter(ledger_entries::idempotency_key.eq(key))
            .order(ledger_entries::created_at.asc())
            .load::<LedgerEntry>(&mut conn)
            .map_err(LedgerError::from)
    }

    fn deposit_by_tx_hash(&self, tx_hash: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        let mut conn = self.conn()?;
        ledger_entries::table
            .filter(ledger_entries::external_tx_hash.eq(tx_hash))
            .filter(ledger_entries::kind.eq(EntryKind::Deposit))
            .first::<LedgerEntry>(&mut conn)
            .optional()
            .map_err(LedgerError::from)
    }

    fn create_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let mut conn = self.conn()?;
        diesel::insert_into(withdrawals::table)
            .values(&withdrawal)
            .get_result::<Withdrawal>(&mut conn)
            .map_err(LedgerError::from)
    }

    fn withdrawal(&self, id: Uuid) -> Result<Withdrawal, LedgerError> {
        let mut conn = self.conn()?;
        withdrawals::table
            .filter(withdrawals::id.eq(id))
            .first::<Withdrawal>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => LedgerError::WithdrawalNotFound(id),
                other => LedgerError::Database(other),
            })
    }

    fn withdrawals_in_status(
        &self,
        status: WithdrawalStatus,
    ) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.conn()?;
        withdrawals::table
            .filter(withdrawals::status.eq(status))
            .order(withdrawals::created_at.asc())
            .load::<Withdrawal>(&mut conn)
            .map_err(LedgerError::from)
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

        let mut conn = self.conn()?;
        let target = withdrawals::table
            .filter(withdrawals::id.eq(id))
            .filter(withdrawals::status.eq(from));

        let settled = matches!(to, WithdrawalStatus::Completed | WithdrawalStatus::Failed);
        let updated = if settled {
            diesel::update(target)
                .set((
                    withdrawals::status.eq(to),
                    withdrawals::processed_at.eq(diesel::dsl::now),
                    withdrawals::updated_at.eq(diesel::dsl::now),
                ))
                .get_result::<Withdrawal>(&mut conn)
                .optional()?
        } else {
            diesel::update(target)
                .set((
                    withdrawals::status.eq(to),
                    withdrawals::updated_at.eq(diesel::dsl::now),
                ))
                .get_result::<Withdrawal>(&mut conn)
                .optional()?
        };

        match updated {
            Some(w) => Ok(w),
            // Distinguish a CAS miss from an id that never existed.
            None => {
                self.withdrawal(id)?;
                Err(LedgerError::Conflict(format!(
                    "withdrawal {} is no longer {}",
                    id, from
                )))
            }
        }
    }

    fn set_withdrawal_tx_hash(&self, id: Uuid, tx_hash: &str) -> Result<Withdrawal, LedgerError> {
        let mut conn = self.conn()?;
        diesel::update(withdrawals::table.filter(withdrawals::id.eq(id)))
            .set((
                withdrawals::tx_hash.eq(tx_hash),
                withdrawals::updated_at.eq(diesel::dsl::now),
            ))
            .get_result::<Withdrawal>(&mut conn)
            .map_err(LedgerError::from)
    }

    fn ping(&self) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map(|_| ())
            .map_err(LedgerError::from)
    }
}
