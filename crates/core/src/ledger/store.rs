//! Storage contracts for accounts and ledger entries.
//!
//! The engine never writes balances directly. Every money movement is
//! handed to [`LedgerStore::commit`] as a [`UnitOfWork`]: balance deltas
//! guarded by the account versions the engine read, plus exactly one ledger
//! entry. The store applies all of it or none of it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quetzal_shared::types::{AccountId, PageRequest, TransactionId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::error::{AccountRef, LedgerError};
use super::types::{Account, AccountActivity, AccountNumber, Transaction};

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Account missing.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Unique account number constraint violated.
    #[error("Account number {0} already exists")]
    DuplicateAccountNumber(AccountNumber),

    /// A reversal of this deposit already exists.
    #[error("Deposit {0} already has a reversal")]
    DuplicateReversal(TransactionId),

    /// Expected version did not match the stored version.
    #[error("Version conflict on account {account_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The account.
        account_id: AccountId,
        /// Version the engine read.
        expected: i64,
        /// Version in the store.
        actual: i64,
    },

    /// Applying the delta would leave a negative balance.
    #[error("Balance of account {0} would go negative")]
    NegativeBalance(AccountId),

    /// Applying the delta would reach the balance limit.
    #[error("Balance of account {0} would exceed the ledger limit")]
    BalanceOverflow(AccountId),

    /// Backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => Self::AccountNotFound(AccountRef::Id(id)),
            StoreError::DuplicateAccountNumber(number) => Self::DuplicateAccountNumber(number),
            StoreError::DuplicateReversal(id) => Self::AlreadyReversed(id),
            StoreError::VersionConflict { .. } | StoreError::NegativeBalance(_) => {
                Self::ConcurrentModification
            }
            StoreError::BalanceOverflow(_) => Self::AmountOverflow,
            StoreError::Backend(message) => Self::Storage(message),
        }
    }
}

/// A guarded balance delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// Account to update.
    pub account_id: AccountId,
    /// Its number, used for lock ordering.
    pub account_number: AccountNumber,
    /// Signed change to apply.
    pub delta: Decimal,
    /// Version the engine validated against.
    pub expected_version: i64,
}

impl BalanceChange {
    /// Credits `amount` to `account`.
    #[must_use]
    pub fn credit(account: &Account, amount: Decimal) -> Self {
        Self {
            account_id: account.id,
            account_number: account.account_number,
            delta: amount,
            expected_version: account.version,
        }
    }

    /// Debits `amount` from `account`.
    #[must_use]
    pub fn debit(account: &Account, amount: Decimal) -> Self {
        Self {
            account_id: account.id,
            account_number: account.account_number,
            delta: -amount,
            expected_version: account.version,
        }
    }
}

/// Balance changes plus the ledger entry that explains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOfWork {
    changes: Vec<BalanceChange>,
    entry: Transaction,
}

impl UnitOfWork {
    /// Starts a unit of work recording `entry`.
    #[must_use]
    pub fn new(entry: Transaction) -> Self {
        Self {
            changes: Vec::new(),
            entry,
        }
    }

    /// Adds a balance change.
    #[must_use]
    pub fn with_change(mut self, change: BalanceChange) -> Self {
        self.changes.push(change);
        self.changes.sort_by_key(|c| c.account_number);
        self
    }

    /// Changes in ascending account-number order, the lock order.
    #[must_use]
    pub fn changes(&self) -> &[BalanceChange] {
        &self.changes
    }

    /// The ledger entry to append.
    #[must_use]
    pub fn entry(&self) -> &Transaction {
        &self.entry
    }

    /// Splits into changes and entry.
    #[must_use]
    pub fn into_parts(self) -> (Vec<BalanceChange>, Transaction) {
        (self.changes, self.entry)
    }
}

/// What a successful commit produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Updated accounts, in the unit's lock order.
    pub accounts: Vec<Account>,
    /// The appended entry.
    pub transaction: Transaction,
}

impl Committed {
    /// Updated state of `number`, if it was part of the unit.
    #[must_use]
    pub fn account(&self, number: AccountNumber) -> Option<&Account> {
        self.accounts.iter().find(|a| a.account_number == number)
    }
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up an account by its external number.
    async fn find_by_number(&self, number: AccountNumber) -> Result<Option<Account>, StoreError>;

    /// Looks up an account by id.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// All accounts owned by `owner`, oldest first.
    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError>;

    /// A page of all accounts, oldest first, with the total count.
    async fn list(&self, page: PageRequest) -> Result<(Vec<Account>, u64), StoreError>;

    /// Persists a new account. Fails with
    /// [`StoreError::DuplicateAccountNumber`] when the number is taken.
    async fn create(&self, account: Account) -> Result<Account, StoreError>;

    /// Marks an account inactive. Idempotent.
    async fn soft_delete(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, StoreError>;

    /// Sets or clears the favorite bookmark.
    async fn set_favorite(
        &self,
        id: AccountId,
        favorite: Option<AccountId>,
        at: DateTime<Utc>,
    ) -> Result<Account, StoreError>;
}

/// Ledger entry persistence. Entries are append-only.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Looks up an entry by id.
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Entries where `number` is source or destination, newest first.
    async fn find_by_account_number(
        &self,
        number: AccountNumber,
        limit: Option<u64>,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// The reversal of `original`, if one exists.
    async fn find_by_original_transaction(
        &self,
        original: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Accounts ranked by total movement, descending, at most `limit`.
    async fn movement_totals(&self, limit: u64) -> Result<Vec<AccountActivity>, StoreError>;
}

/// Atomic writes across accounts and ledger entries.
#[async_trait]
pub trait LedgerStore: AccountStore + TransactionStore {
    /// Applies a unit of work atomically.
    ///
    /// Accounts are acquired in ascending account-number order. Every
    /// expected version is verified before any delta is applied; a mismatch
    /// yields [`StoreError::VersionConflict`] and nothing changes. A second
    /// reversal of the same deposit yields [`StoreError::DuplicateReversal`].
    async fn commit(&self, work: UnitOfWork) -> Result<Committed, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use quetzal_shared::types::Currency;
    use rust_decimal_macros::dec;

    use crate::ledger::types::{AccountType, TransactionType};

    fn account(raw: i64) -> Account {
        Account::open(
            AccountNumber::new(raw).unwrap(),
            UserId::new(),
            Currency::Usd,
            AccountType::Monetary,
            Utc::now(),
        )
    }

    #[test]
    fn test_changes_sorted_by_account_number() {
        let high = account(9_000_000_000);
        let low = account(1_000_000_000);
        let entry = Transaction::single(TransactionType::Transfer, &high, dec!(5), high.owner_id, Utc::now());
        let work = UnitOfWork::new(entry)
            .with_change(BalanceChange::debit(&high, dec!(5)))
            .with_change(BalanceChange::credit(&low, dec!(5)));
        let numbers: Vec<_> = work.changes().iter().map(|c| c.account_number).collect();
        assert_eq!(numbers, vec![low.account_number, high.account_number]);
        assert_eq!(work.changes()[1].delta, dec!(-5));
    }

    #[test]
    fn test_store_error_mapping() {
        let err: LedgerError = StoreError::VersionConflict {
            account_id: AccountId::new(),
            expected: 1,
            actual: 2,
        }
        .into();
        assert!(err.is_retryable());

        let id = TransactionId::new();
        let err: LedgerError = StoreError::DuplicateReversal(id).into();
        assert!(matches!(err, LedgerError::AlreadyReversed(t) if t == id));

        let err: LedgerError = StoreError::BalanceOverflow(AccountId::new()).into();
        assert!(matches!(err, LedgerError::AmountOverflow));
        assert!(!err.is_retryable());

        let err: LedgerError = StoreError::Backend("down".into()).into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
