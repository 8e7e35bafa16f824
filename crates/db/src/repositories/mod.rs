//! `PostgreSQL` implementations of the ledger store contracts.
//!
//! [`PgLedgerStore`] implements `AccountStore`, `TransactionStore` and
//! `LedgerStore` from `quetzal-core`, so the engine runs unchanged against
//! either the in-memory store or the database.

mod account;
mod convert;
mod ledger;
mod transaction;

pub use ledger::PgLedgerStore;
