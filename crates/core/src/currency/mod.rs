//! Multi-currency handling and exchange rates.

pub mod exchange;
pub mod service;

#[cfg(test)]
mod service_props;

pub use exchange::{ExchangeRate, RateProvider, StaticRateTable};
pub use service::{AMOUNT_SCALE, Conversion, CurrencyConverter, CurrencyService, MAX_AMOUNT};
