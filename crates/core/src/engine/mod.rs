//! The ledger engine.
//!
//! Every public operation is one async method returning
//! `Result<_, LedgerError>`. Operations validate against a fresh read of the
//! store, then submit a [`UnitOfWork`](crate::ledger::UnitOfWork) guarded by
//! the versions they read. A version conflict re-runs the whole read and
//! validate step, up to `max_commit_attempts` times.
//!
//! # Modules
//!
//! - `accounts` - open, deactivate, favorite bookmarking
//! - `movements` - deposit, withdrawal, transfer, conversion quotes
//! - `reversal` - privileged deposit reversal
//! - `queries` - read-only account and history views

mod accounts;
mod movements;
mod queries;
mod reversal;

#[cfg(test)]
mod engine_props;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quetzal_shared::LedgerConfig;
use quetzal_shared::types::UserId;
use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::currency::{CurrencyConverter, RateProvider, StaticRateTable};
use crate::ledger::{
    Account, AccountNumber, AccountNumberGenerator, AccountRef, LedgerError, LedgerStore,
    NumberSource, StoreError,
};

/// Number of movements shown on an account detail view.
pub const RECENT_MOVEMENTS: u64 = 5;

/// Runtime policy for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Seconds after a deposit during which it may be reversed.
    pub reversal_window_secs: u64,
    /// Upper bound for a single store call.
    pub store_timeout: Duration,
    /// Attempts at committing before surfacing a version conflict.
    pub max_commit_attempts: u32,
    /// Attempts at drawing an unused account number.
    pub max_account_number_attempts: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            reversal_window_secs: config.reversal_window_secs,
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            max_commit_attempts: config.max_commit_attempts.max(1),
            max_account_number_attempts: config.max_account_number_attempts.max(1),
        }
    }
}

/// Enforces balance invariants and records every money movement.
pub struct LedgerEngine<S> {
    store: Arc<S>,
    converter: CurrencyConverter,
    clock: Arc<dyn Clock>,
    numbers: AccountNumberGenerator,
    settings: LedgerSettings,
}

impl<S> Clone for LedgerEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            converter: self.converter.clone(),
            clock: Arc::clone(&self.clock),
            numbers: self.numbers.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<S> std::fmt::Debug for LedgerEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Creates an engine with the default rate table, the system clock, and
    /// random account numbers.
    #[must_use]
    pub fn new(store: Arc<S>, settings: LedgerSettings) -> Self {
        Self {
            store,
            converter: CurrencyConverter::new(Arc::new(StaticRateTable::default_table())),
            clock: Arc::new(SystemClock),
            numbers: AccountNumberGenerator::random(settings.max_account_number_attempts),
            settings,
        }
    }

    /// Replaces the rate provider.
    #[must_use]
    pub fn with_rates(mut self, rates: Arc<dyn RateProvider>) -> Self {
        self.converter = CurrencyConverter::new(rates);
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the account number source.
    #[must_use]
    pub fn with_number_source(mut self, source: Arc<dyn NumberSource>) -> Self {
        self.numbers = AccountNumberGenerator::new(source, self.settings.max_account_number_attempts);
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active policy.
    #[must_use]
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Runs a store call under the configured timeout.
    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if let Ok(result) = tokio::time::timeout(self.settings.store_timeout, call).await {
            result.map_err(LedgerError::from)
        } else {
            warn!(operation, timeout = ?self.settings.store_timeout, "Store call timed out");
            Err(LedgerError::StorageTimeout)
        }
    }

    /// Re-runs `attempt` while it fails with a retryable error.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && tries < self.settings.max_commit_attempts => {
                    warn!(operation, attempt = tries, "Concurrent modification, retrying");
                    tries += 1;
                }
                Err(err) if err.is_retryable() => {
                    warn!(operation, attempts = tries, "Concurrent modification, giving up");
                    return Err(err);
                }
                other => return other,
            }
        }
    }

    async fn account_by_number(&self, number: AccountNumber) -> Result<Account, LedgerError> {
        self.timed("find_by_number", self.store.find_by_number(number))
            .await?
            .ok_or(LedgerError::AccountNotFound(AccountRef::Number(number)))
    }

    /// Looks up an account the actor owns. Accounts of other users are
    /// reported as missing.
    async fn owned_account(&self, owner: UserId, number: AccountNumber) -> Result<Account, LedgerError> {
        let account = self.account_by_number(number).await?;
        if account.owner_id == owner {
            Ok(account)
        } else {
            Err(LedgerError::AccountNotFound(AccountRef::Number(number)))
        }
    }
}
