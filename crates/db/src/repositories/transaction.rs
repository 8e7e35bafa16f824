//! Ledger entry queries for the `PostgreSQL` store.
//!
//! Entries are only ever inserted by [`LedgerStore::commit`]; this module
//! reads them back.
//!
//! [`LedgerStore::commit`]: quetzal_core::ledger::LedgerStore::commit

use async_trait::async_trait;
use quetzal_core::ledger::{AccountActivity, AccountNumber, StoreError, Transaction, TransactionStore};
use quetzal_shared::types::TransactionId;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DbBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Statement,
};

use super::convert::{account_number, backend, transaction_from_model};
use super::ledger::PgLedgerStore;
use crate::entities::transactions;

/// Each entry counts once for its source and once for its destination.
/// Destinations are credited the converted amount when there is one.
const MOVEMENT_TOTALS_SQL: &str = r"
SELECT account_number,
       SUM(movement) AS total_movement,
       COUNT(*) AS transaction_count
FROM (
    SELECT from_account_number AS account_number, amount AS movement
    FROM transactions
    UNION ALL
    SELECT to_account_number AS account_number, COALESCE(converted_amount, amount) AS movement
    FROM transactions
    WHERE to_account_number IS NOT NULL
) movements
GROUP BY account_number
ORDER BY total_movement DESC, account_number ASC
LIMIT $1
";

#[derive(Debug, FromQueryResult)]
struct ActivityRow {
    account_number: i64,
    total_movement: Decimal,
    transaction_count: i64,
}

impl ActivityRow {
    fn into_activity(self) -> Result<AccountActivity, StoreError> {
        Ok(AccountActivity {
            account_number: account_number(self.account_number)?,
            total_movement: self.total_movement,
            transaction_count: u64::try_from(self.transaction_count).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl TransactionStore for PgLedgerStore {
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(transaction_from_model)
            .transpose()
    }

    async fn find_by_account_number(
        &self,
        number: AccountNumber,
        limit: Option<u64>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut query = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::FromAccountNumber.eq(number.value()))
                    .add(transactions::Column::ToAccountNumber.eq(number.value())),
            )
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }

    async fn find_by_original_transaction(
        &self,
        original: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::OriginalTransactionId.eq(original.into_inner()))
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(transaction_from_model)
            .transpose()
    }

    async fn movement_totals(&self, limit: u64) -> Result<Vec<AccountActivity>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        ActivityRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            MOVEMENT_TOTALS_SQL,
            [limit.into()],
        ))
        .all(&self.db)
        .await
        .map_err(backend)?
        .into_iter()
        .map(ActivityRow::into_activity)
        .collect()
    }
}
