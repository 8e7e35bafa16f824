//! Business rule validation for ledger operations.
//!
//! Pure checks run before any mutation. Each returns the [`LedgerError`]
//! the operation surfaces when the rule is violated.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{Account, AccountNumber, Transaction, TransactionType};
use crate::currency::{AMOUNT_SCALE, MAX_AMOUNT};

/// Amount must be strictly positive, below [`MAX_AMOUNT`] and carry no more
/// than [`AMOUNT_SCALE`] significant decimal places.
///
/// Trailing zeros do not count: `1.50000` is accepted, `0.00001` is not.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount > Decimal::ZERO
        && amount < MAX_AMOUNT
        && amount.normalize().scale() <= AMOUNT_SCALE
    {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

/// Source and destination must differ.
pub fn validate_distinct(from: AccountNumber, to: AccountNumber) -> Result<(), LedgerError> {
    if from == to {
        Err(LedgerError::SameAccountTransfer(from))
    } else {
        Ok(())
    }
}

/// Account must be active to move money.
pub fn ensure_active(account: &Account) -> Result<(), LedgerError> {
    if account.is_active {
        Ok(())
    } else {
        Err(LedgerError::AccountInactive(account.account_number))
    }
}

/// Balance must cover a debit.
pub fn ensure_funds(account: &Account, amount: Decimal) -> Result<(), LedgerError> {
    if account.can_cover(amount) {
        Ok(())
    } else {
        Err(LedgerError::InsufficientFunds {
            account_number: account.account_number,
            available: account.balance,
            requested: amount,
        })
    }
}

/// Entry must be a deposit to be reversed.
pub fn ensure_reversible(entry: &Transaction) -> Result<(), LedgerError> {
    if entry.transaction_type == TransactionType::Deposit {
        Ok(())
    } else {
        Err(LedgerError::InvalidReversalTarget(entry.id))
    }
}

/// Deposit must be no older than `window_secs` at `now`.
///
/// The boundary is inclusive: a deposit exactly `window_secs` old can still
/// be reversed.
pub fn ensure_within_window(
    entry: &Transaction,
    now: DateTime<Utc>,
    window_secs: u64,
) -> Result<(), LedgerError> {
    let elapsed = now.signed_duration_since(entry.created_at);
    let within = i64::try_from(window_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .is_none_or(|window| elapsed <= window);
    if within {
        Ok(())
    } else {
        Err(LedgerError::ReversalWindowExpired {
            transaction_id: entry.id,
            elapsed_secs: elapsed.num_seconds(),
            window_secs,
        })
    }
}

/// Balance must still cover the deposit being reversed.
pub fn ensure_reversal_funds(account: &Account, entry: &Transaction) -> Result<(), LedgerError> {
    if account.can_cover(entry.amount) {
        Ok(())
    } else {
        Err(LedgerError::InsufficientFundsForReversal {
            account_number: account.account_number,
            available: account.balance,
            required: entry.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quetzal_shared::types::{Currency, UserId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use crate::ledger::types::AccountType;

    fn account(balance: Decimal) -> Account {
        let mut account = Account::open(
            AccountNumber::new(1_000_000_000).unwrap(),
            UserId::new(),
            Currency::Usd,
            AccountType::Monetary,
            Utc::now(),
        );
        account.balance = balance;
        account
    }

    fn deposit(account: &Account, amount: Decimal, at: DateTime<Utc>) -> Transaction {
        Transaction::single(TransactionType::Deposit, account, amount, account.owner_id, at)
    }

    #[rstest]
    #[case(dec!(0.01), true)]
    #[case(dec!(100), true)]
    #[case(dec!(0), false)]
    #[case(dec!(-5), false)]
    #[case(dec!(0.0001), true)]
    #[case(dec!(0.00001), false)]
    #[case(dec!(1.50000), true)]
    #[case(dec!(12.34567), false)]
    #[case(dec!(999999999999999.9999), true)]
    #[case(dec!(1000000000000000), false)]
    #[case(dec!(79228162514264337593543950335), false)]
    fn test_validate_amount(#[case] amount: Decimal, #[case] ok: bool) {
        assert_eq!(validate_amount(amount).is_ok(), ok);
    }

    #[test]
    fn test_validate_distinct() {
        let a = AccountNumber::new(1_000_000_001).unwrap();
        let b = AccountNumber::new(1_000_000_002).unwrap();
        assert!(validate_distinct(a, b).is_ok());
        assert!(matches!(
            validate_distinct(a, a),
            Err(LedgerError::SameAccountTransfer(n)) if n == a
        ));
    }

    #[test]
    fn test_ensure_funds_reports_available() {
        let acc = account(dec!(20));
        assert!(ensure_funds(&acc, dec!(20)).is_ok());
        match ensure_funds(&acc, dec!(50)) {
            Err(LedgerError::InsufficientFunds { available, requested, .. }) => {
                assert_eq!(available, dec!(20));
                assert_eq!(requested, dec!(50));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_inactive_account_rejected() {
        let mut acc = account(dec!(10));
        assert!(ensure_active(&acc).is_ok());
        acc.is_active = false;
        assert!(matches!(ensure_active(&acc), Err(LedgerError::AccountInactive(_))));
    }

    #[rstest]
    #[case(TransactionType::Deposit, true)]
    #[case(TransactionType::Withdrawal, false)]
    #[case(TransactionType::Transfer, false)]
    #[case(TransactionType::DepositReversal, false)]
    fn test_only_deposits_are_reversible(#[case] kind: TransactionType, #[case] ok: bool) {
        let acc = account(dec!(10));
        let entry = Transaction::single(kind, &acc, dec!(5), acc.owner_id, Utc::now());
        assert_eq!(ensure_reversible(&entry).is_ok(), ok);
    }

    #[rstest]
    #[case(59, true)]
    #[case(60, true)]
    #[case(61, false)]
    fn test_reversal_window_boundary(#[case] elapsed: i64, #[case] ok: bool) {
        let acc = account(dec!(10));
        let created = Utc::now();
        let entry = deposit(&acc, dec!(5), created);
        let now = created + Duration::seconds(elapsed);
        assert_eq!(ensure_within_window(&entry, now, 60).is_ok(), ok);
    }

    #[rstest]
    #[case(Duration::microseconds(60_000_000), true)]
    #[case(Duration::microseconds(60_000_900), false)]
    #[case(Duration::microseconds(60_000_001), false)]
    fn test_reversal_window_counts_sub_millisecond(#[case] elapsed: Duration, #[case] ok: bool) {
        let acc = account(dec!(10));
        let created = Utc::now();
        let entry = deposit(&acc, dec!(5), created);
        assert_eq!(ensure_within_window(&entry, created + elapsed, 60).is_ok(), ok);
    }

    #[test]
    fn test_huge_reversal_window_never_expires() {
        let acc = account(dec!(10));
        let created = Utc::now();
        let entry = deposit(&acc, dec!(5), created);
        let now = created + Duration::days(365 * 100);
        assert!(ensure_within_window(&entry, now, u64::MAX).is_ok());
    }

    #[test]
    fn test_reversal_needs_original_amount() {
        let acc = account(dec!(4));
        let entry = deposit(&acc, dec!(5), Utc::now());
        assert!(matches!(
            ensure_reversal_funds(&acc, &entry),
            Err(LedgerError::InsufficientFundsForReversal { required, .. }) if required == dec!(5)
        ));
    }
}
