//! Ledger error types for validation, state, and storage errors.
//!
//! Every failure a ledger operation can surface lives here. Validation
//! errors are detected before any mutation; storage errors leave the store
//! in its pre-operation state.

use quetzal_shared::error::{AppError, ErrorDetail};
use quetzal_shared::types::{AccountId, Currency, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::AccountNumber;

/// How an account was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRef {
    /// By store id.
    Id(AccountId),
    /// By external account number.
    Number(AccountNumber),
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<AccountNumber> for AccountRef {
    fn from(number: AccountNumber) -> Self {
        Self::Number(number)
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        Self::Id(id)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be positive, below 10^15 and have at most 4 decimal places.
    #[error("Invalid amount {0}: must be positive, below 10^15, with at most 4 decimal places")]
    InvalidAmount(Decimal),

    /// A converted amount or resulting balance would reach 10^15.
    #[error("Resulting amount exceeds the ledger limit of 10^15")]
    AmountOverflow,

    /// Source and destination are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccountTransfer(AccountNumber),

    /// An account cannot bookmark itself or a missing account.
    #[error("Invalid favorite account: {0}")]
    InvalidFavorite(String),

    // ========== Account Errors ==========
    /// Account not found (or not visible to the actor).
    #[error("Account not found: {0}")]
    AccountNotFound(AccountRef),

    /// Account is inactive and cannot move money.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountNumber),

    /// Balance does not cover the requested amount.
    #[error("Insufficient funds in account {account_number}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The debited account.
        account_number: AccountNumber,
        /// Current balance.
        available: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    /// Account number already taken at persist time.
    #[error("Account number {0} already exists")]
    DuplicateAccountNumber(AccountNumber),

    /// No free account number found within the attempt bound.
    #[error("Could not allocate a unique account number after {attempts} attempts")]
    AccountNumberSpaceExhausted {
        /// Attempts made.
        attempts: u32,
    },

    // ========== Currency Errors ==========
    /// No exchange rate configured for the directed pair.
    #[error("No exchange rate found for {from} to {to}")]
    NoExchangeRate {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
    },

    // ========== Reversal Errors ==========
    /// Transaction missing or not a deposit.
    #[error("Transaction {0} is not a reversible deposit")]
    InvalidReversalTarget(TransactionId),

    /// Deposit is older than the reversal window.
    #[error("Deposit {transaction_id} is {elapsed_secs}s old, beyond the {window_secs}s reversal window")]
    ReversalWindowExpired {
        /// The deposit.
        transaction_id: TransactionId,
        /// Seconds since the deposit.
        elapsed_secs: i64,
        /// Configured window.
        window_secs: u64,
    },

    /// Deposit already has a reversal.
    #[error("Deposit {0} has already been reversed")]
    AlreadyReversed(TransactionId),

    /// Balance no longer covers the deposit being reversed.
    #[error("Insufficient funds to reverse deposit on account {account_number}: available {available}, required {required}")]
    InsufficientFundsForReversal {
        /// The account the deposit credited.
        account_number: AccountNumber,
        /// Current balance.
        available: Decimal,
        /// Original deposit amount.
        required: Decimal,
    },

    // ========== Permission Errors ==========
    /// Role or ownership check failed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Storage Errors ==========
    /// Store call did not complete in time.
    #[error("Storage operation timed out")]
    StorageTimeout,

    /// Opaque backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::SameAccountTransfer(_) => "SAME_ACCOUNT_TRANSFER",
            Self::InvalidFavorite(_) => "INVALID_FAVORITE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::DuplicateAccountNumber(_) => "DUPLICATE_ACCOUNT_NUMBER",
            Self::AccountNumberSpaceExhausted { .. } => "ACCOUNT_NUMBER_SPACE_EXHAUSTED",
            Self::NoExchangeRate { .. } => "NO_EXCHANGE_RATE",
            Self::InvalidReversalTarget(_) => "INVALID_REVERSAL_TARGET",
            Self::ReversalWindowExpired { .. } => "REVERSAL_WINDOW_EXPIRED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::InsufficientFundsForReversal { .. } => "INSUFFICIENT_FUNDS_FOR_REVERSAL",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::StorageTimeout => "STORAGE_TIMEOUT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_)
            | Self::SameAccountTransfer(_)
            | Self::InvalidFavorite(_)
            | Self::NoExchangeRate { .. } => 400,

            // 403 Forbidden - permission errors
            Self::Forbidden(_) => 403,

            // 404 Not Found
            Self::AccountNotFound(_) => 404,

            // 409 Conflict - state and concurrency errors
            Self::DuplicateAccountNumber(_)
            | Self::AlreadyReversed(_)
            | Self::ConcurrentModification => 409,

            // 422 Unprocessable - business rule violations
            Self::AccountInactive(_)
            | Self::AmountOverflow
            | Self::InsufficientFunds { .. }
            | Self::InvalidReversalTarget(_)
            | Self::ReversalWindowExpired { .. }
            | Self::InsufficientFundsForReversal { .. } => 422,

            // 500 Internal Server Error
            Self::AccountNumberSpaceExhausted { .. } | Self::Storage(_) => 500,

            // 504 Gateway Timeout
            Self::StorageTimeout => 504,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let detail = ErrorDetail::new(err.error_code(), err.to_string());
        if matches!(err, LedgerError::Storage(_)) {
            return Self::Storage(detail);
        }
        match err.http_status_code() {
            400 => Self::InvalidInput(detail),
            403 => Self::Forbidden(detail),
            404 => Self::NotFound(detail),
            409 => Self::Conflict {
                retryable: err.is_retryable(),
                detail,
            },
            422 => Self::Rejected(detail),
            504 => Self::Timeout(detail),
            _ => Self::Internal(detail.to_string()),
        }
    }
}
