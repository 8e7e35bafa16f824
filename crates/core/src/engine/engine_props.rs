//! Property-based tests for the ledger engine.
//!
//! - Balance equals the sum of successful movements and never goes negative
//! - Every successful movement appends exactly one entry; failures append none
//! - Transfers conserve value under the applied rate

use std::sync::Arc;

use proptest::prelude::*;
use quetzal_shared::types::{Currency, UserId};
use rust_decimal::Decimal;

use super::{LedgerEngine, LedgerSettings};
use crate::auth::Actor;
use crate::currency::{CurrencyService, StaticRateTable};
use crate::ledger::{
    AccountStore, AccountType, InMemoryLedgerStore, LedgerError, OpenAccountRequest,
};

#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
}

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..50_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![amount().prop_map(Op::Deposit), amount().prop_map(Op::Withdraw)]
}

fn rate() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn request(currency: Currency) -> OpenAccountRequest {
    OpenAccountRequest {
        currency,
        account_type: AccountType::Monetary,
        owner_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// *For any* sequence of deposits and withdrawals, the final balance is
    /// the sum of the successful ones and the ledger has one entry per success.
    #[test]
    fn prop_balance_tracks_successful_movements(ops in prop::collection::vec(op(), 1..30)) {
        runtime().block_on(async {
            let store = Arc::new(InMemoryLedgerStore::new());
            let engine = LedgerEngine::new(Arc::clone(&store), LedgerSettings::default());
            let actor = Actor::client(UserId::new());
            let account = engine.open_account(&actor, request(Currency::Usd)).await.unwrap();

            let mut expected = Decimal::ZERO;
            let mut successes = 0usize;
            for op in ops {
                match op {
                    Op::Deposit(amount) => {
                        let receipt = engine.deposit(&actor, account.account_number, amount).await.unwrap();
                        expected += amount;
                        successes += 1;
                        prop_assert_eq!(receipt.balance.amount, expected);
                    }
                    Op::Withdraw(amount) => {
                        match engine.withdraw(&actor, account.account_number, amount).await {
                            Ok(receipt) => {
                                expected -= amount;
                                successes += 1;
                                prop_assert_eq!(receipt.balance.amount, expected);
                            }
                            Err(LedgerError::InsufficientFunds { available, .. }) => {
                                prop_assert!(amount > expected);
                                prop_assert_eq!(available, expected);
                            }
                            Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                        }
                    }
                }
                prop_assert!(expected >= Decimal::ZERO);
            }

            let stored = store.find_by_id(account.id).await.unwrap().unwrap();
            prop_assert_eq!(stored.balance, expected);
            prop_assert_eq!(store.transaction_count().await, successes);
            Ok(())
        })?;
    }

    /// *For any* funded source and rate, a transfer debits exactly `amount`
    /// and credits exactly `round(amount * rate)`.
    #[test]
    fn prop_transfer_conserves_value_under_rate(
        funding in amount(),
        amount in amount(),
        rate in rate(),
    ) {
        runtime().block_on(async {
            let store = Arc::new(InMemoryLedgerStore::new());
            let rates = StaticRateTable::empty().with_rate(Currency::Usd, Currency::Eur, rate);
            let engine = LedgerEngine::new(Arc::clone(&store), LedgerSettings::default())
                .with_rates(Arc::new(rates));
            let alice = Actor::client(UserId::new());
            let bob = Actor::client(UserId::new());
            let source = engine.open_account(&alice, request(Currency::Usd)).await.unwrap();
            let target = engine.open_account(&bob, request(Currency::Eur)).await.unwrap();
            engine.deposit(&alice, source.account_number, funding).await.unwrap();

            let result = engine
                .transfer(&alice, source.account_number, target.account_number, amount)
                .await;

            let source_after = store.find_by_id(source.id).await.unwrap().unwrap();
            let target_after = store.find_by_id(target.id).await.unwrap().unwrap();
            if amount <= funding {
                let receipt = result.unwrap();
                let credited = CurrencyService::convert(amount, rate).unwrap();
                prop_assert_eq!(source_after.balance, funding - amount);
                prop_assert_eq!(target_after.balance, credited);
                prop_assert_eq!(receipt.transaction.converted_amount, Some(credited));
                prop_assert_eq!(store.transaction_count().await, 2);
            } else {
                let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
                prop_assert!(is_insufficient);
                prop_assert_eq!(source_after.balance, funding);
                prop_assert_eq!(target_after.balance, Decimal::ZERO);
                prop_assert_eq!(store.transaction_count().await, 1);
            }
            Ok(())
        })?;
    }
}
