//! Read-only views over accounts and history.

use quetzal_shared::types::{AccountId, PageRequest, PageResponse};

use super::{LedgerEngine, RECENT_MOVEMENTS};
use crate::auth::{Actor, Role, require_owner_or_privileged, require_role};
use crate::ledger::{
    Account, AccountActivity, AccountDetail, AccountNumber, AccountRef, LedgerError, LedgerStore,
    Transaction,
};

impl<S: LedgerStore> LedgerEngine<S> {
    /// The actor's own accounts.
    pub async fn my_accounts(&self, actor: &Actor) -> Result<Vec<Account>, LedgerError> {
        self.timed("find_by_owner", self.store.find_by_owner(actor.id))
            .await
    }

    /// One account by id, for its owner or a privileged actor.
    pub async fn account_by_id(&self, actor: &Actor, id: AccountId) -> Result<Account, LedgerError> {
        let account = self
            .timed("find_by_id", self.store.find_by_id(id))
            .await?
            .ok_or(LedgerError::AccountNotFound(AccountRef::Id(id)))?;
        require_owner_or_privileged(actor, account.owner_id)?;
        Ok(account)
    }

    /// Every account, paginated. Privileged only.
    pub async fn all_accounts(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<PageResponse<Account>, LedgerError> {
        require_role(actor, Role::PRIVILEGED)?;
        let (data, total) = self.timed("list_accounts", self.store.list(page)).await?;
        Ok(PageResponse::for_request(data, page, total))
    }

    /// Entries where the account is source or destination, newest first.
    pub async fn transaction_history(
        &self,
        actor: &Actor,
        number: AccountNumber,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let account = self.account_by_number(number).await?;
        require_owner_or_privileged(actor, account.owner_id)?;
        self.timed(
            "find_by_account_number",
            self.store.find_by_account_number(number, None),
        )
        .await
    }

    /// Accounts ranked by total movement. Privileged only.
    pub async fn most_active_accounts(
        &self,
        actor: &Actor,
        limit: u64,
    ) -> Result<Vec<AccountActivity>, LedgerError> {
        require_role(actor, Role::PRIVILEGED)?;
        self.timed("movement_totals", self.store.movement_totals(limit))
            .await
    }

    /// An account with its latest movements.
    pub async fn account_detail(
        &self,
        actor: &Actor,
        number: AccountNumber,
    ) -> Result<AccountDetail, LedgerError> {
        let account = self.account_by_number(number).await?;
        require_owner_or_privileged(actor, account.owner_id)?;
        let recent_transactions = self
            .timed(
                "find_by_account_number",
                self.store.find_by_account_number(number, Some(RECENT_MOVEMENTS)),
            )
            .await?;
        Ok(AccountDetail {
            account,
            recent_transactions,
        })
    }
}
