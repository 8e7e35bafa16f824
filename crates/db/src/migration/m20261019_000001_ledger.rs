//! Ledger schema migration.
//!
//! Creates the enums, the `accounts` and `transactions` tables, their
//! constraints and indexes, and the trigger that keeps ledger entries
//! append-only.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE currency_code AS ENUM ('USD', 'EUR', 'GTQ', 'MXN', 'COP', 'ARS', 'JPY', 'GBP');

CREATE TYPE account_type AS ENUM ('Monetary', 'Savings');

CREATE TYPE transaction_type AS ENUM (
    'DEPOSIT',
    'WITHDRAWAL',
    'TRANSFER',
    'DEPOSIT_REVERSAL'
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    account_number BIGINT NOT NULL,
    owner_id UUID NOT NULL,
    currency currency_code NOT NULL,
    account_type account_type NOT NULL,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    favorite_account_id UUID REFERENCES accounts(id),
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_account_number UNIQUE (account_number),
    CONSTRAINT chk_account_number_range CHECK (
        account_number BETWEEN 1000000000 AND 9999999999
    ),
    CONSTRAINT chk_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_favorite_not_self CHECK (favorite_account_id IS NULL OR favorite_account_id <> id)
);

CREATE INDEX idx_accounts_owner ON accounts(owner_id, created_at);
CREATE INDEX idx_accounts_created ON accounts(created_at, id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    from_account_number BIGINT NOT NULL REFERENCES accounts(account_number),
    to_account_number BIGINT REFERENCES accounts(account_number),
    amount NUMERIC(19, 4) NOT NULL,
    transaction_type transaction_type NOT NULL,
    currency currency_code NOT NULL,
    converted_to currency_code,
    converted_amount NUMERIC(19, 4),
    owner_id UUID NOT NULL,
    original_transaction_id UUID REFERENCES transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_transactions_original UNIQUE (original_transaction_id),
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transfer_destination CHECK (
        (transaction_type = 'TRANSFER') = (to_account_number IS NOT NULL)
    ),
    CONSTRAINT chk_transfer_distinct CHECK (
        to_account_number IS NULL OR to_account_number <> from_account_number
    ),
    CONSTRAINT chk_conversion_pair CHECK (
        (converted_to IS NULL) = (converted_amount IS NULL)
    ),
    CONSTRAINT chk_reversal_reference CHECK (
        (transaction_type = 'DEPOSIT_REVERSAL') = (original_transaction_id IS NOT NULL)
    )
);

CREATE INDEX idx_txn_from_created ON transactions(from_account_number, created_at DESC);
CREATE INDEX idx_txn_to_created ON transactions(to_account_number, created_at DESC)
    WHERE to_account_number IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_mutation
-- Ledger entries are never updated or deleted
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Ledger entries are immutable. Record a reversal instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_transactions_immutable
BEFORE UPDATE OR DELETE ON transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_mutation();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_transactions_immutable ON transactions;
DROP FUNCTION IF EXISTS prevent_ledger_mutation();

DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS account_type;
DROP TYPE IF EXISTS currency_code;
";
