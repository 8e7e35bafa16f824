//! Account lifecycle: open, deactivate, favorite bookmarking.

use quetzal_shared::types::{Currency, UserId};
use tracing::{debug, info};

use super::LedgerEngine;
use crate::auth::{Actor, Role, require_owner_or_privileged, require_role};
use crate::ledger::{
    Account, AccountNumber, AccountType, LedgerError, LedgerStore, OpenAccountRequest,
};

impl<S: LedgerStore> LedgerEngine<S> {
    /// Opens a zero-balance account.
    ///
    /// A client always opens for themself. A privileged actor may name
    /// another owner.
    pub async fn open_account(
        &self,
        actor: &Actor,
        request: OpenAccountRequest,
    ) -> Result<Account, LedgerError> {
        let owner_id = match request.owner_id {
            Some(owner) if owner != actor.id => {
                require_role(actor, Role::PRIVILEGED)?;
                owner
            }
            _ => actor.id,
        };

        let account = self
            .numbers
            .generate(|number| {
                self.claim_number(number, owner_id, request.currency, request.account_type)
            })
            .await?;

        info!(
            account_id = %account.id,
            account_number = %account.account_number,
            owner_id = %owner_id,
            currency = %account.currency,
            "Account opened"
        );
        Ok(account)
    }

    /// Tries to persist an account under `number`. `Ok(None)` means taken.
    async fn claim_number(
        &self,
        number: AccountNumber,
        owner_id: UserId,
        currency: Currency,
        account_type: AccountType,
    ) -> Result<Option<Account>, LedgerError> {
        if self
            .timed("find_by_number", self.store.find_by_number(number))
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let account = Account::open(number, owner_id, currency, account_type, self.clock.now());
        match self.timed("create_account", self.store.create(account)).await {
            Ok(created) => Ok(Some(created)),
            Err(LedgerError::DuplicateAccountNumber(_)) => {
                debug!(account_number = %number, "Account number claimed concurrently");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Soft-deletes an account. Already inactive accounts come back unchanged.
    pub async fn deactivate_account(
        &self,
        actor: &Actor,
        number: AccountNumber,
    ) -> Result<Account, LedgerError> {
        let account = self.account_by_number(number).await?;
        require_owner_or_privileged(actor, account.owner_id)?;

        if !account.is_active {
            return Ok(account);
        }

        let account = self
            .timed("soft_delete", self.store.soft_delete(account.id, self.clock.now()))
            .await?;
        info!(account_number = %number, actor_id = %actor.id, "Account deactivated");
        Ok(account)
    }

    /// Bookmarks another account, or clears the bookmark with `None`.
    pub async fn set_favorite_account(
        &self,
        actor: &Actor,
        number: AccountNumber,
        favorite: Option<AccountNumber>,
    ) -> Result<Account, LedgerError> {
        let account = self.account_by_number(number).await?;
        if account.owner_id != actor.id {
            return Err(LedgerError::Forbidden(
                "only the owner may bookmark a favorite account".to_string(),
            ));
        }

        let favorite_id = match favorite {
            None => None,
            Some(fav) if fav == number => {
                return Err(LedgerError::InvalidFavorite(
                    "an account cannot bookmark itself".to_string(),
                ));
            }
            Some(fav) => {
                let target = self
                    .timed("find_by_number", self.store.find_by_number(fav))
                    .await?
                    .ok_or_else(|| LedgerError::InvalidFavorite(format!("account {fav} does not exist")))?;
                Some(target.id)
            }
        };

        let account = self
            .timed(
                "set_favorite",
                self.store.set_favorite(account.id, favorite_id, self.clock.now()),
            )
            .await?;
        debug!(account_number = %number, favorite = ?favorite, "Favorite account updated");
        Ok(account)
    }
}
