//! Exchange rate types and rate providers.
//!
//! Rates are directed: a `USD -> GTQ` entry says nothing about `GTQ -> USD`.
//! The default table is neither symmetric nor complete, so callers must
//! handle a missing pair.

use std::collections::HashMap;
use std::str::FromStr;

use quetzal_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange rate between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Exchange rate (1 `from` = rate `to`).
    pub rate: Decimal,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub const fn new(from: Currency, to: Currency, rate: Decimal) -> Self {
        Self { from, to, rate }
    }
}

/// Source of conversion factors.
///
/// The static table is the default; a live feed can be swapped in behind
/// the same trait.
pub trait RateProvider: Send + Sync {
    /// Returns the rate for `from -> to`, if one is known.
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal>;
}

/// In-process directed rate table.
#[derive(Debug, Clone, Default)]
pub struct StaticRateTable {
    rates: HashMap<(Currency, Currency), Decimal>,
}

/// Rates shipped with the default table, as `(from, to, rate)` strings.
const DEFAULT_RATES: &[(Currency, Currency, &str)] = &[
    (Currency::Usd, Currency::Eur, "0.92"),
    (Currency::Usd, Currency::Gtq, "7.75"),
    (Currency::Usd, Currency::Mxn, "17.05"),
    (Currency::Usd, Currency::Cop, "3950"),
    (Currency::Usd, Currency::Ars, "870"),
    (Currency::Usd, Currency::Jpy, "149.50"),
    (Currency::Usd, Currency::Gbp, "0.79"),
    (Currency::Eur, Currency::Usd, "1.09"),
    (Currency::Eur, Currency::Gtq, "8.42"),
    (Currency::Eur, Currency::Gbp, "0.86"),
    (Currency::Gtq, Currency::Usd, "0.129"),
    (Currency::Gtq, Currency::Eur, "0.119"),
    (Currency::Gtq, Currency::Mxn, "2.20"),
    (Currency::Mxn, Currency::Usd, "0.0587"),
    (Currency::Mxn, Currency::Gtq, "0.455"),
    (Currency::Cop, Currency::Usd, "0.000253"),
    (Currency::Ars, Currency::Usd, "0.00115"),
    (Currency::Jpy, Currency::Usd, "0.00669"),
    (Currency::Gbp, Currency::Usd, "1.27"),
    (Currency::Gbp, Currency::Eur, "1.16"),
];

impl StaticRateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the table of rates the bank quotes by default.
    #[must_use]
    pub fn default_table() -> Self {
        DEFAULT_RATES
            .iter()
            .filter_map(|(from, to, rate)| {
                Decimal::from_str(rate)
                    .ok()
                    .map(|rate| ExchangeRate::new(*from, *to, rate))
            })
            .collect()
    }

    /// Adds or replaces a directed rate.
    #[must_use]
    pub fn with_rate(mut self, from: Currency, to: Currency, rate: Decimal) -> Self {
        self.insert(ExchangeRate::new(from, to, rate));
        self
    }

    /// Adds or replaces a directed rate. Non-positive rates are ignored.
    pub fn insert(&mut self, rate: ExchangeRate) {
        if rate.rate > Decimal::ZERO {
            self.rates.insert((rate.from, rate.to), rate.rate);
        }
    }

    /// Number of directed pairs in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the table has no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<ExchangeRate> for StaticRateTable {
    fn from_iter<I: IntoIterator<Item = ExchangeRate>>(iter: I) -> Self {
        let mut table = Self::empty();
        for rate in iter {
            table.insert(rate);
        }
        table
    }
}

impl RateProvider for StaticRateTable {
    fn rate(&self, from: Currency, to: Currency) -> Option<Decimal> {
        self.rates.get(&(from, to)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_table_parses_every_rate() {
        assert_eq!(StaticRateTable::default_table().len(), DEFAULT_RATES.len());
    }

    #[test]
    fn test_default_table_is_directed() {
        let table = StaticRateTable::default_table();
        assert_eq!(table.rate(Currency::Usd, Currency::Gtq), Some(dec!(7.75)));
        assert_eq!(table.rate(Currency::Gtq, Currency::Usd), Some(dec!(0.129)));
        assert_eq!(table.rate(Currency::Ars, Currency::Jpy), None);
    }

    #[test]
    fn test_non_positive_rates_are_ignored() {
        let table = StaticRateTable::empty()
            .with_rate(Currency::Usd, Currency::Eur, dec!(0))
            .with_rate(Currency::Usd, Currency::Gbp, dec!(-1));
        assert!(table.is_empty());
    }

    #[test]
    fn test_with_rate_replaces_existing_pair() {
        let table = StaticRateTable::empty()
            .with_rate(Currency::Usd, Currency::Eur, dec!(0.90))
            .with_rate(Currency::Usd, Currency::Eur, dec!(0.95));
        assert_eq!(table.rate(Currency::Usd, Currency::Eur), Some(dec!(0.95)));
        assert_eq!(table.len(), 1);
    }
}
