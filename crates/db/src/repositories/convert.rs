//! Conversions between `SeaORM` models and ledger domain types.

use chrono::{DateTime, FixedOffset, Utc};
use quetzal_core::ledger::{
    Account, AccountNumber, AccountType, StoreError, Transaction, TransactionType,
};
use quetzal_shared::types::{AccountId, Currency, TransactionId, UserId};
use sea_orm::{DbErr, Set, SqlErr};

use crate::entities::{accounts, sea_orm_active_enums as db_enums, transactions};

/// Constraint guarding account number uniqueness.
pub const ACCOUNT_NUMBER_CONSTRAINT: &str = "uq_accounts_account_number";
/// Constraint guarding one reversal per deposit.
pub const ORIGINAL_TRANSACTION_CONSTRAINT: &str = "uq_transactions_original";

/// Maps a database error, folding unique violations on `constraint` into `on_unique`.
pub fn map_db_err(err: DbErr, constraint: &str, on_unique: impl FnOnce() -> StoreError) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains(constraint) => {
            on_unique()
        }
        _ => backend(err),
    }
}

/// Wraps any database error as an opaque backend failure.
pub fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

pub fn account_number(raw: i64) -> Result<AccountNumber, StoreError> {
    AccountNumber::new(raw)
        .ok_or_else(|| StoreError::Backend(format!("stored account number out of range: {raw}")))
}

pub const fn currency_to_db(currency: Currency) -> db_enums::CurrencyCode {
    match currency {
        Currency::Usd => db_enums::CurrencyCode::Usd,
        Currency::Eur => db_enums::CurrencyCode::Eur,
        Currency::Gtq => db_enums::CurrencyCode::Gtq,
        Currency::Mxn => db_enums::CurrencyCode::Mxn,
        Currency::Cop => db_enums::CurrencyCode::Cop,
        Currency::Ars => db_enums::CurrencyCode::Ars,
        Currency::Jpy => db_enums::CurrencyCode::Jpy,
        Currency::Gbp => db_enums::CurrencyCode::Gbp,
    }
}

pub const fn currency_from_db(code: db_enums::CurrencyCode) -> Currency {
    match code {
        db_enums::CurrencyCode::Usd => Currency::Usd,
        db_enums::CurrencyCode::Eur => Currency::Eur,
        db_enums::CurrencyCode::Gtq => Currency::Gtq,
        db_enums::CurrencyCode::Mxn => Currency::Mxn,
        db_enums::CurrencyCode::Cop => Currency::Cop,
        db_enums::CurrencyCode::Ars => Currency::Ars,
        db_enums::CurrencyCode::Jpy => Currency::Jpy,
        db_enums::CurrencyCode::Gbp => Currency::Gbp,
    }
}

const fn account_type_to_db(kind: AccountType) -> db_enums::AccountType {
    match kind {
        AccountType::Monetary => db_enums::AccountType::Monetary,
        AccountType::Savings => db_enums::AccountType::Savings,
    }
}

const fn account_type_from_db(kind: db_enums::AccountType) -> AccountType {
    match kind {
        db_enums::AccountType::Monetary => AccountType::Monetary,
        db_enums::AccountType::Savings => AccountType::Savings,
    }
}

const fn transaction_type_to_db(kind: TransactionType) -> db_enums::TransactionType {
    match kind {
        TransactionType::Deposit => db_enums::TransactionType::Deposit,
        TransactionType::Withdrawal => db_enums::TransactionType::Withdrawal,
        TransactionType::Transfer => db_enums::TransactionType::Transfer,
        TransactionType::DepositReversal => db_enums::TransactionType::DepositReversal,
    }
}

const fn transaction_type_from_db(kind: db_enums::TransactionType) -> TransactionType {
    match kind {
        db_enums::TransactionType::Deposit => TransactionType::Deposit,
        db_enums::TransactionType::Withdrawal => TransactionType::Withdrawal,
        db_enums::TransactionType::Transfer => TransactionType::Transfer,
        db_enums::TransactionType::DepositReversal => TransactionType::DepositReversal,
    }
}

fn to_utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub fn account_from_model(model: accounts::Model) -> Result<Account, StoreError> {
    Ok(Account {
        id: AccountId::from_uuid(model.id),
        account_number: account_number(model.account_number)?,
        owner_id: UserId::from_uuid(model.owner_id),
        currency: currency_from_db(model.currency),
        account_type: account_type_from_db(model.account_type),
        balance: model.balance,
        is_active: model.is_active,
        favorite_account_id: model.favorite_account_id.map(AccountId::from_uuid),
        version: model.version,
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

pub fn account_to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        account_number: Set(account.account_number.value()),
        owner_id: Set(account.owner_id.into_inner()),
        currency: Set(currency_to_db(account.currency)),
        account_type: Set(account_type_to_db(account.account_type)),
        balance: Set(account.balance),
        is_active: Set(account.is_active),
        favorite_account_id: Set(account.favorite_account_id.map(AccountId::into_inner)),
        version: Set(account.version),
        created_at: Set(account.created_at.into()),
        updated_at: Set(account.updated_at.into()),
    }
}

pub fn transaction_from_model(model: transactions::Model) -> Result<Transaction, StoreError> {
    Ok(Transaction {
        id: TransactionId::from_uuid(model.id),
        from_account_number: account_number(model.from_account_number)?,
        to_account_number: model.to_account_number.map(account_number).transpose()?,
        amount: model.amount,
        transaction_type: transaction_type_from_db(model.transaction_type),
        currency: currency_from_db(model.currency),
        converted_to: model.converted_to.map(currency_from_db),
        converted_amount: model.converted_amount,
        owner_id: UserId::from_uuid(model.owner_id),
        original_transaction_id: model.original_transaction_id.map(TransactionId::from_uuid),
        created_at: to_utc(model.created_at),
    })
}

pub fn transaction_to_active(entry: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(entry.id.into_inner()),
        from_account_number: Set(entry.from_account_number.value()),
        to_account_number: Set(entry.to_account_number.map(|n| n.value())),
        amount: Set(entry.amount),
        transaction_type: Set(transaction_type_to_db(entry.transaction_type)),
        currency: Set(currency_to_db(entry.currency)),
        converted_to: Set(entry.converted_to.map(currency_to_db)),
        converted_amount: Set(entry.converted_amount),
        owner_id: Set(entry.owner_id.into_inner()),
        original_transaction_id: Set(entry.original_transaction_id.map(TransactionId::into_inner)),
        created_at: Set(entry.created_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_account() -> Account {
        Account::open(
            AccountNumber::new(4_321_098_765).unwrap(),
            UserId::new(),
            Currency::Gtq,
            AccountType::Savings,
            Utc::now(),
        )
    }

    #[test]
    fn test_currency_mapping_covers_every_code() {
        for currency in Currency::ALL {
            assert_eq!(currency_from_db(currency_to_db(currency)), currency);
        }
    }

    #[test]
    fn test_account_model_mapping() {
        let account = sample_account();
        let active = account_to_active(&account);
        let model = accounts::Model {
            id: active.id.unwrap(),
            account_number: active.account_number.unwrap(),
            owner_id: active.owner_id.unwrap(),
            currency: active.currency.unwrap(),
            account_type: active.account_type.unwrap(),
            balance: dec!(12.5),
            is_active: active.is_active.unwrap(),
            favorite_account_id: None,
            version: 3,
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };

        let mapped = account_from_model(model).unwrap();
        assert_eq!(mapped.id, account.id);
        assert_eq!(mapped.account_number, account.account_number);
        assert_eq!(mapped.currency, Currency::Gtq);
        assert_eq!(mapped.account_type, AccountType::Savings);
        assert_eq!(mapped.balance, dec!(12.5));
        assert_eq!(mapped.version, 3);
    }

    #[test]
    fn test_out_of_range_number_is_a_backend_error() {
        assert!(matches!(account_number(42), Err(StoreError::Backend(_))));
    }

    #[test]
    fn test_transfer_entry_mapping() {
        let account = sample_account();
        let mut entry = Transaction::single(
            TransactionType::Transfer,
            &account,
            dec!(30),
            account.owner_id,
            Utc::now(),
        );
        entry.to_account_number = AccountNumber::new(1_234_567_890);
        entry.converted_to = Some(Currency::Usd);
        entry.converted_amount = Some(dec!(3.87));

        let active = transaction_to_active(&entry);
        assert_eq!(active.to_account_number.clone().unwrap(), Some(1_234_567_890));
        assert_eq!(
            active.transaction_type.clone().unwrap(),
            db_enums::TransactionType::Transfer
        );
        assert_eq!(
            active.converted_to.clone().unwrap(),
            Some(db_enums::CurrencyCode::Usd)
        );
    }
}
