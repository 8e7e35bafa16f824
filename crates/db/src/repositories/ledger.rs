//! `PostgreSQL` ledger store.
//!
//! A unit of work runs inside one database transaction. Each touched account
//! row is locked with `SELECT ... FOR UPDATE` in ascending account-number
//! order, its version is checked, the delta is applied and the version
//! bumped. The ledger entry is inserted last; the unique constraint on
//! `original_transaction_id` rejects a second reversal of the same deposit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quetzal_core::currency::MAX_AMOUNT;
use quetzal_core::ledger::{
    Account, BalanceChange, Committed, LedgerStore, StoreError, UnitOfWork,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use super::convert::{
    ORIGINAL_TRANSACTION_CONSTRAINT, account_from_model, backend, map_db_err,
    transaction_from_model, transaction_to_active,
};
use crate::entities::{accounts, transactions};

/// Ledger store backed by `PostgreSQL` through `SeaORM`.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pub(super) db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a new store over an established connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Locks one account row, verifies its version and applies the delta.
    async fn apply_change(
        txn: &DatabaseTransaction,
        change: &BalanceChange,
        at: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let current = accounts::Entity::find_by_id(change.account_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(backend)?
            .ok_or(StoreError::AccountNotFound(change.account_id))?;

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

        let version = current.version + 1;
        let mut active: accounts::ActiveModel = current.into();
        active.balance = Set(balance);
        active.version = Set(version);
        active.updated_at = Set(at.into());

        let updated = active.update(txn).await.map_err(backend)?;
        account_from_model(updated)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn commit(&self, work: UnitOfWork) -> Result<Committed, StoreError> {
        let (changes, entry) = work.into_parts();
        let txn = self.db.begin().await.map_err(backend)?;

        if let Some(original) = entry.original_transaction_id {
            let existing = transactions::Entity::find()
                .filter(transactions::Column::OriginalTransactionId.eq(original.into_inner()))
                .one(&txn)
                .await
                .map_err(backend)?;
            if existing.is_some() {
                return Err(StoreError::DuplicateReversal(original));
            }
        }

        // Any early return drops `txn`, which rolls it back.
        let mut accounts = Vec::with_capacity(changes.len());
        for change in &changes {
            accounts.push(Self::apply_change(&txn, change, entry.created_at).await?);
        }

        let inserted = transaction_to_active(&entry)
            .insert(&txn)
            .await
            .map_err(|err| match entry.original_transaction_id {
                Some(original) => map_db_err(err, ORIGINAL_TRANSACTION_CONSTRAINT, || {
                    StoreError::DuplicateReversal(original)
                }),
                None => backend(err),
            })?;

        txn.commit().await.map_err(backend)?;

        debug!(
            transaction_id = %entry.id,
            kind = entry.transaction_type.as_str(),
            accounts = accounts.len(),
            "Unit of work committed"
        );

        Ok(Committed {
            accounts,
            transaction: transaction_from_model(inserted)?,
        })
    }
}
