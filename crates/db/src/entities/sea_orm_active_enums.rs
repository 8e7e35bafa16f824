//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Postgres `currency_code` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "currency_code")]
pub enum CurrencyCode {
    /// US dollar.
    #[sea_orm(string_value = "USD")]
    Usd,
    /// Euro.
    #[sea_orm(string_value = "EUR")]
    Eur,
    /// Guatemalan quetzal.
    #[sea_orm(string_value = "GTQ")]
    Gtq,
    /// Mexican peso.
    #[sea_orm(string_value = "MXN")]
    Mxn,
    /// Colombian peso.
    #[sea_orm(string_value = "COP")]
    Cop,
    /// Argentine peso.
    #[sea_orm(string_value = "ARS")]
    Ars,
    /// Japanese yen.
    #[sea_orm(string_value = "JPY")]
    Jpy,
    /// Pound sterling.
    #[sea_orm(string_value = "GBP")]
    Gbp,
}

/// Postgres `account_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    /// Checking account.
    #[sea_orm(string_value = "Monetary")]
    Monetary,
    /// Savings account.
    #[sea_orm(string_value = "Savings")]
    Savings,
}

/// Postgres `transaction_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    /// Deposit.
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    /// Withdrawal.
    #[sea_orm(string_value = "WITHDRAWAL")]
    Withdrawal,
    /// Transfer between accounts.
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    /// Reversal of a deposit.
    #[sea_orm(string_value = "DEPOSIT_REVERSAL")]
    DepositReversal,
}
