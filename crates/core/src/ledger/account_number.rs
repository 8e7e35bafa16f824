//! Account number allocation.
//!
//! Numbers are drawn uniformly from the 10-digit range and checked against
//! the store. The store's unique constraint is the authority: a duplicate at
//! insert time is treated like any other collision and counts against the
//! same attempt bound.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use tracing::debug;

use super::error::LedgerError;
use super::types::AccountNumber;

/// Source of raw account number candidates.
pub trait NumberSource: Send + Sync {
    /// Draws the next candidate.
    fn draw(&self) -> i64;
}

/// Uniform draws from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNumberSource;

impl NumberSource for RandomNumberSource {
    fn draw(&self) -> i64 {
        rand::rng().random_range(AccountNumber::MIN..=AccountNumber::MAX)
    }
}

/// Replays a fixed list of candidates, repeating the last one.
///
/// Lets tests force collisions deterministically.
#[derive(Debug, Default)]
pub struct ScriptedNumbers {
    values: Vec<i64>,
    next: AtomicUsize,
}

impl ScriptedNumbers {
    /// Creates a source replaying `values`.
    #[must_use]
    pub fn new(values: Vec<i64>) -> Self {
        Self {
            values,
            next: AtomicUsize::new(0),
        }
    }
}

impl NumberSource for ScriptedNumbers {
    fn draw(&self) -> i64 {
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        self.values
            .get(idx)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(AccountNumber::MIN)
    }
}

/// Bounded rejection sampler for account numbers.
#[derive(Clone)]
pub struct AccountNumberGenerator {
    source: Arc<dyn NumberSource>,
    max_attempts: u32,
}

impl std::fmt::Debug for AccountNumberGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountNumberGenerator")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl AccountNumberGenerator {
    /// Creates a generator over `source`, giving up after `max_attempts`.
    #[must_use]
    pub fn new(source: Arc<dyn NumberSource>, max_attempts: u32) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Creates a generator over the thread-local RNG.
    #[must_use]
    pub fn random(max_attempts: u32) -> Self {
        Self::new(Arc::new(RandomNumberSource), max_attempts)
    }

    /// Attempt bound.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draws one candidate in range.
    #[must_use]
    pub fn candidate(&self) -> AccountNumber {
        AccountNumber::saturating(self.source.draw())
    }

    /// Draws candidates until `claim` accepts one.
    ///
    /// `claim` returns `Ok(Some(_))` once the number is taken for good,
    /// `Ok(None)` on a collision, or an error that aborts generation.
    pub async fn generate<T, F, Fut>(&self, mut claim: F) -> Result<T, LedgerError>
    where
        F: FnMut(AccountNumber) -> Fut,
        Fut: Future<Output = Result<Option<T>, LedgerError>>,
    {
        for attempt in 1..=self.max_attempts {
            let number = self.candidate();
            if let Some(claimed) = claim(number).await? {
                return Ok(claimed);
            }
            debug!(attempt, account_number = %number, "account number collision");
        }
        Err(LedgerError::AccountNumberSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}
