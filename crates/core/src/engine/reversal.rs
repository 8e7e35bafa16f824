//! Privileged deposit reversal.
//!
//! Preconditions are checked in a fixed order so callers see the most
//! specific failure: role, target kind, window, prior reversal, account
//! state, funds.

use quetzal_shared::types::TransactionId;
use tracing::info;

use super::LedgerEngine;
use super::movements::movement_receipt;
use crate::auth::{Actor, Role, require_role};
use crate::ledger::validation::{
    ensure_active, ensure_reversal_funds, ensure_reversible, ensure_within_window,
};
use crate::ledger::{
    BalanceChange, LedgerError, LedgerStore, MovementReceipt, Transaction, TransactionType,
    UnitOfWork,
};

impl<S: LedgerStore> LedgerEngine<S> {
    /// Undoes a recent deposit.
    ///
    /// The store guarantees at most one reversal per deposit, so two
    /// concurrent attempts cannot both succeed.
    pub async fn reverse_deposit(
        &self,
        actor: &Actor,
        transaction_id: TransactionId,
    ) -> Result<MovementReceipt, LedgerError> {
        require_role(actor, Role::PRIVILEGED)?;

        let receipt = self
            .with_retry("reverse_deposit", || self.try_reverse(actor, transaction_id))
            .await?;

        info!(
            original_transaction_id = %transaction_id,
            reversal_id = %receipt.transaction.id,
            account_number = %receipt.account_number,
            amount = %receipt.amount,
            actor_id = %actor.id,
            "Deposit reversed"
        );
        Ok(receipt)
    }

    async fn try_reverse(
        &self,
        actor: &Actor,
        transaction_id: TransactionId,
    ) -> Result<MovementReceipt, LedgerError> {
        let deposit = self
            .timed("find_transaction", self.store.find_transaction(transaction_id))
            .await?
            .ok_or(LedgerError::InvalidReversalTarget(transaction_id))?;
        ensure_reversible(&deposit)?;

        let now = self.clock.now();
        ensure_within_window(&deposit, now, self.settings.reversal_window_secs)?;

        if self
            .timed(
                "find_by_original_transaction",
                self.store.find_by_original_transaction(transaction_id),
            )
            .await?
            .is_some()
        {
            return Err(LedgerError::AlreadyReversed(transaction_id));
        }

        let account = self.account_by_number(deposit.from_account_number).await?;
        ensure_active(&account)?;
        ensure_reversal_funds(&account, &deposit)?;

        let mut entry = Transaction::single(
            TransactionType::DepositReversal,
            &account,
            deposit.amount,
            actor.id,
            now,
        );
        entry.original_transaction_id = Some(deposit.id);

        let work =
            UnitOfWork::new(entry).with_change(BalanceChange::debit(&account, deposit.amount));
        let committed = self.timed("commit", self.store.commit(work)).await?;
        movement_receipt(&committed, account.account_number, deposit.amount)
    }
}
