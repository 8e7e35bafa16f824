//! Core business logic for Quetzal.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the ledger engine live here.
//!
//! # Modules
//!
//! - `auth` - Roles, actors, and capability checks
//! - `currency` - Exchange rates and conversion
//! - `ledger` - Accounts, ledger entries, store contracts
//! - `engine` - Money movements, reversals, and queries
//! - `clock` - Injectable time source

pub mod auth;
pub mod clock;
pub mod currency;
pub mod engine;
pub mod ledger;

pub use engine::{LedgerEngine, LedgerSettings};
