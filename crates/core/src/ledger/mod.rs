//! Account ledger domain.
//!
//! - Account and ledger entry types
//! - Error taxonomy for ledger operations
//! - Pure precondition checks
//! - Store contracts and the unit of work
//! - In-memory store
//! - Account number allocation

pub mod account_number;
pub mod error;
pub mod memory;
pub mod store;
pub mod types;
pub mod validation;

pub use account_number::{AccountNumberGenerator, NumberSource, RandomNumberSource, ScriptedNumbers};
pub use error::{AccountRef, LedgerError};
pub use memory::InMemoryLedgerStore;
pub use store::{
    AccountStore, BalanceChange, Committed, LedgerStore, StoreError, TransactionStore, UnitOfWork,
};
pub use types::{
    Account, AccountActivity, AccountDetail, AccountNumber, AccountType, MovementReceipt,
    OpenAccountRequest, Transaction, TransactionType, TransferReceipt,
};
