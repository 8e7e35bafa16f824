//! Currency conversion between account currencies.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Round converted amounts to 4 decimal places (the storage precision)
//! - Use banker's rounding (round half to even)
//! - Keep both original and converted amounts on the ledger entry

use std::sync::Arc;

use quetzal_shared::types::Currency;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use super::exchange::RateProvider;
use crate::ledger::LedgerError;

/// Decimal places kept on converted amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Exclusive upper bound on any amount or balance: 10^15.
///
/// `NUMERIC(19, 4)` columns hold 15 integer digits.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Rounding helpers shared by every conversion.
pub struct CurrencyService;

impl CurrencyService {
    /// Convert amount using exchange rate with Banker's Rounding.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use quetzal_core::currency::CurrencyService;
    ///
    /// let result = CurrencyService::convert(dec!(30), dec!(7.75));
    /// assert_eq!(result, Some(dec!(232.5)));
    /// ```
    ///
    /// Returns `None` when the product reaches [`MAX_AMOUNT`].
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(rate)
            .map(|value| Self::round(value, AMOUNT_SCALE))
            .filter(|value| *value < MAX_AMOUNT)
    }

    /// Round a decimal value using Banker's Rounding (MidpointNearestEven).
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }
}

/// Outcome of converting an amount between two currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Rate applied (1 when the currencies match).
    pub rate: Decimal,
    /// Amount in the source currency.
    pub amount: Decimal,
    /// Amount in the target currency.
    pub converted_amount: Decimal,
}

impl Conversion {
    /// Returns true if the conversion crossed currencies.
    #[must_use]
    pub fn is_cross_currency(&self) -> bool {
        self.from != self.to
    }
}

/// Converts amounts through a [`RateProvider`].
#[derive(Clone)]
pub struct CurrencyConverter {
    rates: Arc<dyn RateProvider>,
}

impl std::fmt::Debug for CurrencyConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyConverter").finish_non_exhaustive()
    }
}

impl CurrencyConverter {
    /// Creates a converter over the given rate provider.
    #[must_use]
    pub fn new(rates: Arc<dyn RateProvider>) -> Self {
        Self { rates }
    }

    /// Converts `amount` from one currency to another.
    ///
    /// Same-currency conversions return the amount unchanged without
    /// consulting the provider.
    pub fn convert(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Conversion, LedgerError> {
        if from == to {
            return Ok(Conversion {
                from,
                to,
                rate: Decimal::ONE,
                amount,
                converted_amount: amount,
            });
        }

        let rate = self
            .rates
            .rate(from, to)
            .ok_or(LedgerError::NoExchangeRate { from, to })?;
        let converted_amount =
            CurrencyService::convert(amount, rate).ok_or(LedgerError::AmountOverflow)?;

        Ok(Conversion {
            from,
            to,
            rate,
            amount,
            converted_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::StaticRateTable;
    use rust_decimal_macros::dec;

    fn converter() -> CurrencyConverter {
        CurrencyConverter::new(Arc::new(StaticRateTable::default_table()))
    }

    #[test]
    fn test_convert_usd_to_gtq() {
        let conversion = converter()
            .convert(dec!(30), Currency::Usd, Currency::Gtq)
            .unwrap();
        assert_eq!(conversion.converted_amount, dec!(232.5));
        assert_eq!(conversion.rate, dec!(7.75));
        assert!(conversion.is_cross_currency());
    }

    #[test]
    fn test_same_currency_is_identity() {
        let empty = CurrencyConverter::new(Arc::new(StaticRateTable::empty()));
        let conversion = empty.convert(dec!(10.1234), Currency::Eur, Currency::Eur).unwrap();
        assert_eq!(conversion.converted_amount, dec!(10.1234));
        assert_eq!(conversion.rate, Decimal::ONE);
        assert!(!conversion.is_cross_currency());
    }

    #[test]
    fn test_missing_pair_fails() {
        let err = converter()
            .convert(dec!(1), Currency::Ars, Currency::Jpy)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NoExchangeRate {
                from: Currency::Ars,
                to: Currency::Jpy
            }
        ));
    }

    #[test]
    fn test_convert_rounds_to_4_decimals() {
        // 100 * 1.23456789 = 123.456789 -> 123.4568
        assert_eq!(
            CurrencyService::convert(dec!(100), dec!(1.23456789)),
            Some(dec!(123.4568))
        );
    }

    #[test]
    fn test_max_amount_is_ten_to_the_fifteenth() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000000));
    }

    #[test]
    fn test_convert_past_limit_is_none() {
        assert_eq!(CurrencyService::convert(dec!(999999999999), dec!(3950)), None);
        assert_eq!(CurrencyService::convert(Decimal::MAX, dec!(2)), None);
        assert_eq!(
            CurrencyService::convert(dec!(253164556962), dec!(3950)),
            Some(dec!(999999999999900))
        );
    }

    #[test]
    fn test_cross_currency_overflow_is_an_error() {
        let err = converter()
            .convert(dec!(999999999999), Currency::Usd, Currency::Cop)
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow));
    }

    #[test]
    fn test_bankers_rounding_midpoint_to_even() {
        assert_eq!(CurrencyService::round(dec!(2.5), 0), dec!(2));
        assert_eq!(CurrencyService::round(dec!(3.5), 0), dec!(4));
        assert_eq!(CurrencyService::round(dec!(2.25), 1), dec!(2.2));
        assert_eq!(CurrencyService::round(dec!(2.35), 1), dec!(2.4));
    }
}
