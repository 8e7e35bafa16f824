//! `SeaORM` Entity for transactions table.
//!
//! Rows are append-only; a trigger rejects UPDATE and DELETE.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CurrencyCode, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_account_number: i64,
    pub to_account_number: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub currency: CurrencyCode,
    pub converted_to: Option<CurrencyCode>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub converted_amount: Option<Decimal>,
    pub owner_id: Uuid,
    #[sea_orm(unique)]
    pub original_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromAccountNumber",
        to = "super::accounts::Column::AccountNumber"
    )]
    SourceAccount,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::OriginalTransactionId",
        to = "Column::Id"
    )]
    OriginalTransaction,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
