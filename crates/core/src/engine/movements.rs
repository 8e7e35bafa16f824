//! Money movements: deposit, withdrawal, transfer.

use chrono::{DateTime, Utc};
use quetzal_shared::types::{Currency, Money};
use rust_decimal::Decimal;
use tracing::info;

use super::LedgerEngine;
use crate::auth::{Actor, Role, require_role};
use crate::currency::Conversion;
use crate::ledger::validation::{ensure_active, ensure_funds, validate_amount, validate_distinct};
use crate::ledger::{
    Account, AccountNumber, BalanceChange, Committed, LedgerError, LedgerStore, MovementReceipt,
    Transaction, TransactionType, TransferReceipt, UnitOfWork,
};

impl<S: LedgerStore> LedgerEngine<S> {
    /// Credits `amount` to one of the actor's accounts.
    pub async fn deposit(
        &self,
        actor: &Actor,
        number: AccountNumber,
        amount: Decimal,
    ) -> Result<MovementReceipt, LedgerError> {
        require_role(actor, Role::ACCOUNT_HOLDER)?;
        validate_amount(amount)?;

        let receipt = self
            .with_retry("deposit", || self.try_deposit(actor, number, amount))
            .await?;

        info!(
            account_number = %number,
            transaction_id = %receipt.transaction.id,
            amount = %receipt.amount,
            balance = %receipt.balance,
            "Deposit recorded"
        );
        Ok(receipt)
    }

    async fn try_deposit(
        &self,
        actor: &Actor,
        number: AccountNumber,
        amount: Decimal,
    ) -> Result<MovementReceipt, LedgerError> {
        let account = self.owned_account(actor.id, number).await?;
        ensure_active(&account)?;

        let entry = Transaction::single(
            TransactionType::Deposit,
            &account,
            amount,
            actor.id,
            self.clock.now(),
        );
        let work = UnitOfWork::new(entry).with_change(BalanceChange::credit(&account, amount));
        let committed = self.timed("commit", self.store.commit(work)).await?;
        movement_receipt(&committed, number, amount)
    }

    /// Debits `amount` from one of the actor's accounts.
    pub async fn withdraw(
        &self,
        actor: &Actor,
        number: AccountNumber,
        amount: Decimal,
    ) -> Result<MovementReceipt, LedgerError> {
        require_role(actor, Role::ACCOUNT_HOLDER)?;
        validate_amount(amount)?;

        let receipt = self
            .with_retry("withdraw", || self.try_withdraw(actor, number, amount))
            .await?;

        info!(
            account_number = %number,
            transaction_id = %receipt.transaction.id,
            amount = %receipt.amount,
            balance = %receipt.balance,
            "Withdrawal recorded"
        );
        Ok(receipt)
    }

    async fn try_withdraw(
        &self,
        actor: &Actor,
        number: AccountNumber,
        amount: Decimal,
    ) -> Result<MovementReceipt, LedgerError> {
        let account = self.owned_account(actor.id, number).await?;
        ensure_active(&account)?;
        ensure_funds(&account, amount)?;

        let entry = Transaction::single(
            TransactionType::Withdrawal,
            &account,
            amount,
            actor.id,
            self.clock.now(),
        );
        let work = UnitOfWork::new(entry).with_change(BalanceChange::debit(&account, amount));
        let committed = self.timed("commit", self.store.commit(work)).await?;
        movement_receipt(&committed, number, amount)
    }

    /// Moves `amount` from one of the actor's accounts to any active
    /// account, converting currencies when they differ.
    pub async fn transfer(
        &self,
        actor: &Actor,
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        require_role(actor, Role::ACCOUNT_HOLDER)?;
        validate_amount(amount)?;
        validate_distinct(from, to)?;

        let receipt = self
            .with_retry("transfer", || self.try_transfer(actor, from, to, amount))
            .await?;

        info!(
            from_account = %from,
            to_account = %to,
            transaction_id = %receipt.transaction.id,
            amount = %receipt.amount,
            converted_amount = %receipt.converted_amount,
            "Transfer recorded"
        );
        Ok(receipt)
    }

    async fn try_transfer(
        &self,
        actor: &Actor,
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let source = self.owned_account(actor.id, from).await?;
        ensure_active(&source)?;
        ensure_funds(&source, amount)?;

        let destination = self.account_by_number(to).await?;
        ensure_active(&destination)?;

        let conversion = self
            .converter
            .convert(amount, source.currency, destination.currency)?;

        let entry = transfer_entry(&source, &destination, &conversion, actor, self.clock.now());
        let work = UnitOfWork::new(entry)
            .with_change(BalanceChange::debit(&source, amount))
            .with_change(BalanceChange::credit(&destination, conversion.converted_amount));
        let committed = self.timed("commit", self.store.commit(work)).await?;

        let source_balance = committed_account(&committed, from)?.balance_money();
        Ok(TransferReceipt {
            from_account_number: from,
            to_account_number: to,
            amount: source.money(amount),
            converted_amount: destination.money(conversion.converted_amount),
            source_balance,
            transaction: committed.transaction,
        })
    }

    /// Quotes a conversion without moving money.
    pub fn quote_conversion(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Conversion, LedgerError> {
        validate_amount(amount)?;
        self.converter.convert(amount, from, to)
    }
}

fn transfer_entry(
    source: &Account,
    destination: &Account,
    conversion: &Conversion,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Transaction {
    let mut entry = Transaction::single(
        TransactionType::Transfer,
        source,
        conversion.amount,
        actor.id,
        now,
    );
    entry.to_account_number = Some(destination.account_number);
    if conversion.is_cross_currency() {
        entry.converted_to = Some(destination.currency);
        entry.converted_amount = Some(conversion.converted_amount);
    }
    entry
}

fn committed_account(committed: &Committed, number: AccountNumber) -> Result<&Account, LedgerError> {
    committed.account(number).ok_or_else(|| {
        LedgerError::Storage(format!("commit did not return account {number}"))
    })
}

pub(super) fn movement_receipt(
    committed: &Committed,
    number: AccountNumber,
    amount: Decimal,
) -> Result<MovementReceipt, LedgerError> {
    let account = committed_account(committed, number)?;
    Ok(MovementReceipt {
        account_number: number,
        amount: Money::new(amount, account.currency),
        balance: account.balance_money(),
        transaction: committed.transaction.clone(),
    })
}
