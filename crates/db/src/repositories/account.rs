//! Account persistence for the `PostgreSQL` store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quetzal_core::ledger::{Account, AccountNumber, AccountStore, StoreError};
use quetzal_shared::types::{AccountId, PageRequest, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use super::convert::{
    ACCOUNT_NUMBER_CONSTRAINT, account_from_model, account_to_active, backend, map_db_err,
};
use super::ledger::PgLedgerStore;
use crate::entities::accounts;

impl PgLedgerStore {
    async fn require_account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.find_by_id(id)
            .await?
            .ok_or(StoreError::AccountNotFound(id))
    }
}

#[async_trait]
impl AccountStore for PgLedgerStore {
    async fn find_by_number(&self, number: AccountNumber) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::AccountNumber.eq(number.value()))
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(account_from_model)
            .transpose()
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(account_from_model)
            .transpose()
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(account_from_model)
            .collect()
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<Account>, u64), StoreError> {
        let total = accounts::Entity::find()
            .count(&self.db)
            .await
            .map_err(backend)?;

        let data = accounts::Entity::find()
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(account_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((data, total))
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let number = account.account_number;
        let model = account_to_active(&account)
            .insert(&self.db)
            .await
            .map_err(|err| {
                map_db_err(err, ACCOUNT_NUMBER_CONSTRAINT, || {
                    StoreError::DuplicateAccountNumber(number)
                })
            })?;
        account_from_model(model)
    }

    async fn soft_delete(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, StoreError> {
        // Only active rows change, so repeated calls leave the version alone.
        accounts::Entity::update_many()
            .col_expr(accounts::Column::IsActive, Expr::value(false))
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(at))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        self.require_account(id).await
    }

    async fn set_favorite(
        &self,
        id: AccountId,
        favorite: Option<AccountId>,
        at: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        if let Some(fav) = favorite {
            self.require_account(fav).await?;
        }

        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::FavoriteAccountId,
                Expr::value(favorite.map(AccountId::into_inner)),
            )
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(at))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            return Err(StoreError::AccountNotFound(id));
        }
        self.require_account(id).await
    }
}
