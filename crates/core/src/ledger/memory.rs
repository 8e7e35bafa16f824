//! In-memory ledger store.
//!
//! Holds every account and entry behind one async mutex, so a unit of work
//! is trivially atomic. Used by tests and by embedders that do not need
//! durability.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quetzal_shared::types::{AccountId, PageRequest, TransactionId, UserId};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::store::{AccountStore, Committed, LedgerStore, StoreError, TransactionStore, UnitOfWork};
use crate::currency::MAX_AMOUNT;
use super::types::{Account, AccountActivity, AccountNumber, Transaction};

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
}

impl State {
    fn position(&self, id: AccountId) -> Option<usize> {
        self.accounts.iter().position(|a| a.id == id)
    }

    fn update<F>(&mut self, id: AccountId, at: DateTime<Utc>, f: F) -> Result<Account, StoreError>
    where
        F: FnOnce(&mut Account) -> bool,
    {
        let idx = self.position(id).ok_or(StoreError::AccountNotFound(id))?;
        let account = &mut self.accounts[idx];
        if f(account) {
            account.version += 1;
            account.updated_at = at;
        }
        Ok(account.clone())
    }
}

/// Ledger store backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ledger entries.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    /// Overwrites an account's balance. Test setup only; no entry is recorded.
    pub async fn seed_balance(&self, id: AccountId, balance: Decimal) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        let idx = state.position(id).ok_or(StoreError::AccountNotFound(id))?;
        state.accounts[idx].balance = balance;
        state.accounts[idx].version += 1;
        Ok(state.accounts[idx].clone())
    }
}

#[async_trait]
impl AccountStore for InMemoryLedgerStore {
    async fn find_by_number(&self, number: AccountNumber) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.account_number == number)
            .cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<Account>, u64), StoreError> {
        let state = self.state.lock().await;
        let total = state.accounts.len() as u64;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let data = state.accounts.iter().skip(skip).take(take).cloned().collect();
        Ok((data, total))
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .accounts
            .iter()
            .any(|a| a.account_number == account.account_number)
        {
            return Err(StoreError::DuplicateAccountNumber(account.account_number));
        }
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn soft_delete(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        state.update(id, at, |account| {
            let was_active = account.is_active;
            account.is_active = false;
            was_active
        })
    }

    async fn set_favorite(
        &self,
        id: AccountId,
        favorite: Option<AccountId>,
        at: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(fav) = favorite {
            state.position(fav).ok_or(StoreError::AccountNotFound(fav))?;
        }
        state.update(id, at, |account| {
            account.favorite_account_id = favorite;
            true
        })
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedgerStore {
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_account_number(
        &self,
        number: AccountNumber,
        limit: Option<u64>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.lock().await;
        // Reverse append order first so equal timestamps stay newest first.
        let mut entries: Vec<Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.touches(number))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(entries)
    }

    async fn find_by_original_transaction(
        &self,
        original: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.original_transaction_id == Some(original))
            .cloned())
    }

    async fn movement_totals(&self, limit: u64) -> Result<Vec<AccountActivity>, StoreError> {
        let state = self.state.lock().await;
        let mut totals: HashMap<AccountNumber, (Decimal, u64)> = HashMap::new();
        for entry in &state.transactions {
            let mut record = |number: AccountNumber| {
                let slot = totals.entry(number).or_insert((Decimal::ZERO, 0));
                slot.0 = slot.0.saturating_add(entry.movement_for(number));
                slot.1 += 1;
            };
            record(entry.from_account_number);
            if let Some(to) = entry.to_account_number {
                record(to);
            }
        }

        let mut ranked: Vec<AccountActivity> = totals
            .into_iter()
            .map(|(account_number, (total_movement, transaction_count))| AccountActivity {
                account_number,
                total_movement,
                transaction_count,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_movement
                .cmp(&a.total_movement)
                .then(a.account_number.cmp(&b.account_number))
        });
        ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(ranked)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn commit(&self, work: UnitOfWork) -> Result<Committed, StoreError> {
        let mut state = self.state.lock().await;
        let (changes, entry) = work.into_parts();

        if let Some(original) = entry.original_transaction_id
            && state
                .transactions
                .iter()
                .any(|t| t.original_transaction_id == Some(original))
        {
            return Err(StoreError::DuplicateReversal(original));
        }

        // Validate everything before touching state.
        let mut staged = Vec::with_capacity(changes.len());
        for change in &changes {
            let idx = state
                .position(change.account_id)
                .ok_or(StoreError::AccountNotFound(change.account_id))?;
            let current = &state.accounts[idx];
            if current.version != change.expected_version {
                return Err(StoreError::VersionConflict {
                    account_id: change.account_id,
                    expected: change.expected_version,
                    actual: current.version,
                });
            }
            let balance = current
                .balance
                .checked_add(change.delta)
                .filter(|b| *b < MAX_AMOUNT)
                .ok_or(StoreError::BalanceOverflow(change.account_id))?;
            if balance < Decimal::ZERO {
                return Err(StoreError::NegativeBalance(change.account_id));
            }
            let mut next = current.clone();
            next.balance = balance;
            next.version += 1;
            next.updated_at = entry.created_at;
            staged.push((idx, next));
        }

        let mut accounts = Vec::with_capacity(staged.len());
        for (idx, next) in staged {
            state.accounts[idx] = next.clone();
            accounts.push(next);
        }
        state.transactions.push(entry.clone());

        Ok(Committed {
            accounts,
            transaction: entry,
        })
    }
}
