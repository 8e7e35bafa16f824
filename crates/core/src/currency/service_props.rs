//! Property-based tests for currency conversion.
//!
//! - Banker's rounding keeps at most 4 decimal places
//! - Same-currency conversion is the identity
//! - Conversion through a known pair is deterministic and positive

use std::sync::Arc;

use proptest::prelude::*;
use quetzal_shared::types::Currency;
use rust_decimal::Decimal;

use super::exchange::StaticRateTable;
use super::service::{CurrencyConverter, CurrencyService};

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn any_currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* amount and rate, the converted amount has at most 4 decimal places.
    #[test]
    fn prop_convert_rounds_to_4_decimals(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let result = CurrencyService::convert(amount, rate).unwrap();
        let scaled = result * Decimal::from(10_000);
        prop_assert_eq!(scaled, scaled.round());
    }

    /// *For any* amount and currency, converting to the same currency returns the amount.
    #[test]
    fn prop_same_currency_is_identity(
        amount in positive_amount(),
        currency in any_currency(),
    ) {
        let converter = CurrencyConverter::new(Arc::new(StaticRateTable::empty()));
        let conversion = converter.convert(amount, currency, currency).unwrap();
        prop_assert_eq!(conversion.converted_amount, amount);
    }

    /// *For any* positive amount and rate, the configured pair yields
    /// `round(amount * rate)` and a non-negative result.
    #[test]
    fn prop_configured_pair_applies_rate(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let table = StaticRateTable::empty().with_rate(Currency::Usd, Currency::Gtq, rate);
        let converter = CurrencyConverter::new(Arc::new(table));
        let conversion = converter.convert(amount, Currency::Usd, Currency::Gtq).unwrap();
        prop_assert_eq!(Some(conversion.converted_amount), CurrencyService::convert(amount, rate));
        prop_assert!(conversion.converted_amount >= Decimal::ZERO);
        prop_assert_eq!(conversion.rate, rate);
    }
}
