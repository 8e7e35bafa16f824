//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes an account may be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Guatemalan Quetzal
    Gtq,
    /// Mexican Peso
    Mxn,
    /// Colombian Peso
    Cop,
    /// Argentine Peso
    Ars,
    /// Japanese Yen
    Jpy,
    /// Pound Sterling
    Gbp,
}

impl Currency {
    /// Every supported currency, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Usd,
        Self::Eur,
        Self::Gtq,
        Self::Mxn,
        Self::Cop,
        Self::Ars,
        Self::Jpy,
        Self::Gbp,
    ];

    /// Returns the three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gtq => "GTQ",
            Self::Mxn => "MXN",
            Self::Cop => "COP",
            Self::Ars => "ARS",
            Self::Jpy => "JPY",
            Self::Gbp => "GBP",
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("Unknown currency: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_new() {
        let amount = dec!(100.00);
        let money = Money::new(amount, Currency::Gtq);
        assert_eq!(money.amount, amount);
        assert_eq!(money.currency, Currency::Gtq);
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Jpy);
        assert!(money.is_zero());
        assert!(!money.is_negative());
        assert_eq!(money.currency, Currency::Jpy);
    }

    #[test]
    fn test_money_is_negative() {
        assert!(!Money::new(dec!(10), Currency::Usd).is_negative());
        assert!(Money::new(dec!(-10), Currency::Usd).is_negative());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(dec!(232.5), Currency::Gtq).to_string(), "232.5 GTQ");
    }

    #[test]
    fn test_currency_round_trips_through_code() {
        for currency in Currency::ALL {
            assert_eq!(Currency::from_str(currency.code()).unwrap(), currency);
            assert_eq!(currency.to_string(), currency.code());
        }
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("gtq").unwrap(), Currency::Gtq);
        assert!(Currency::from_str("IDR").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_currency_serde_uses_iso_code() {
        let json = serde_json::to_string(&Currency::Mxn).unwrap();
        assert_eq!(json, "\"MXN\"");
        let parsed: Currency = serde_json::from_str("\"ARS\"").unwrap();
        assert_eq!(parsed, Currency::Ars);
    }
}
