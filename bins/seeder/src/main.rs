//! Demo seeder for Quetzal.
//!
//! Applies pending migrations, opens two demo accounts and walks them
//! through a deposit, a cross-currency transfer, a rejected withdrawal and
//! a deposit reversal, logging every step.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use quetzal_core::auth::{Actor, Role};
use quetzal_core::ledger::{AccountType, LedgerError, OpenAccountRequest};
use quetzal_core::{LedgerEngine, LedgerSettings};
use quetzal_db::PgLedgerStore;
use quetzal_db::migration::{Migrator, MigratorTrait};
use quetzal_shared::AppConfig;
use quetzal_shared::types::{Currency, PageRequest, UserId};
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = quetzal_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to apply migrations")?;
    info!("Migrations applied");

    let settings = LedgerSettings::from(&config.ledger);
    let engine = LedgerEngine::new(Arc::new(PgLedgerStore::new(db)), settings);

    run_demo(&engine).await?;

    info!("Seeding complete");
    Ok(())
}

async fn run_demo(engine: &LedgerEngine<PgLedgerStore>) -> anyhow::Result<()> {
    let alice = Actor::client(UserId::new());
    let bob = Actor::client(UserId::new());
    let admin = Actor::new(UserId::new(), Role::Admin);

    let usd = engine
        .open_account(
            &alice,
            OpenAccountRequest {
                currency: Currency::Usd,
                account_type: AccountType::Monetary,
                owner_id: None,
            },
        )
        .await?;
    let gtq = engine
        .open_account(
            &admin,
            OpenAccountRequest {
                currency: Currency::Gtq,
                account_type: AccountType::Savings,
                owner_id: Some(bob.id),
            },
        )
        .await?;
    info!(usd = %usd.account_number, gtq = %gtq.account_number, "Demo accounts opened");

    engine.deposit(&alice, usd.account_number, dec!(100)).await?;
    let deposit = engine.deposit(&alice, usd.account_number, dec!(50)).await?;

    let transfer = engine
        .transfer(&alice, usd.account_number, gtq.account_number, dec!(30))
        .await?;
    info!(
        source_balance = %transfer.source_balance,
        credited = %transfer.converted_amount,
        "Cross-currency transfer recorded"
    );

    match engine.withdraw(&bob, gtq.account_number, dec!(1000)).await {
        Err(LedgerError::InsufficientFunds { available, .. }) => {
            info!(%available, "Overdraft rejected as expected");
        }
        Ok(receipt) => warn!(balance = %receipt.balance, "Overdraft unexpectedly accepted"),
        Err(other) => return Err(other.into()),
    }

    let reversal = engine
        .reverse_deposit(&admin, deposit.transaction.id)
        .await?;
    info!(balance = %reversal.balance, "Deposit reversed");

    let accounts = engine.all_accounts(&admin, PageRequest::default()).await?;
    let ranking = engine.most_active_accounts(&admin, 5).await?;
    info!(
        total_accounts = accounts.meta.total,
        ranked = ranking.len(),
        "Ledger summary"
    );

    Ok(())
}
