//! Dexido Pool Node
//!
//! Entry point for the dexido binary. Wires the staking pool to in-memory
//! ledgers, deploys it from configuration, and drives a scripted two-day
//! scenario: day-one staking through a referral chain, then a day-two
//! redemption that fans the reward split across the upline.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lib_exchange::PriceBoard;
use lib_ledger::{
    Clock, InMemoryNativeLedger, InMemoryTokenLedger, ManualClock, NativeLedger, SystemClock,
    TokenLedger,
};
use lib_pool::{DeployParams, Pool};
use lib_types::{Address, TokenId, SECONDS_PER_DAY};

mod config;

use config::NodeConfig;

/// Dexido IDO pool node
#[derive(Parser, Debug)]
#[command(name = "dexido", author, version, about, long_about = None)]
struct DexidoArgs {
    /// Configuration file path (TOML); built-in defaults apply without one
    #[arg(short, long, env = "DEXIDO_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = DexidoArgs::parse();
    let config = match &args.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => NodeConfig::default(),
    };

    run_demo(&config)
}

/// Stable account identity derived from a label
fn account_id(label: &str) -> Address {
    Address::new(*blake3::hash(label.as_bytes()).as_bytes())
}

/// Stable token identity derived from a label
fn token_id(label: &str) -> TokenId {
    TokenId::new(*blake3::hash(label.as_bytes()).as_bytes())
}

/// Deploy the pool and drive the scripted scenario over a manual clock
fn run_demo(config: &NodeConfig) -> anyhow::Result<()> {
    let owner = account_id("dexido.owner");
    let vault = account_id("dexido.vault");
    let top = account_id("dexido.top");
    let token = token_id("dexido.token.usd");

    let clock = ManualClock::new(SystemClock.now());
    let native = InMemoryNativeLedger::new();
    let tokens = InMemoryTokenLedger::new();
    tokens.register(token)?;
    let mut board = PriceBoard::new(owner, account_id("dexido.oracle"));
    board.set_price(owner, token, config.demo.token_price, &tokens)?;

    native.credit(owner, config.pool.funding)?;
    let mut pool = Pool::new(owner, vault);
    let start = clock.now() + config.pool.start_lead_secs;
    pool.deploy(
        &clock,
        &native,
        owner,
        DeployParams {
            start,
            duration: config.duration_secs(),
            reward_rate_permil: config.pool.reward_rate_permil,
            oracle: board.address(),
            top,
        },
        config.pool.funding,
    )?;
    tracing::info!(
        "pool live: start={} days={} daily_limit={}",
        start,
        config.pool.duration_days,
        pool.pool_daily_limit()
    );

    // day one: top anchors the referral tree, then the depositors stake as
    // a chain with the largest stake at the shallow end
    clock.set(start);
    let depositors: Vec<Address> = (1..=config.demo.stakes.len())
        .map(|index| account_id(&format!("dexido.depositor.{}", index)))
        .collect();

    native.credit(top, config.demo.top_stake)?;
    pool.deposit(&clock, &native, top, config.demo.top_stake)?;
    let mut under = top;
    for (who, stake) in depositors.iter().zip(&config.demo.stakes).rev() {
        native.credit(*who, *stake)?;
        pool.accept(*who, under)?;
        pool.deposit(&clock, &native, *who, *stake)?;
        under = *who;
    }
    tracing::info!(
        "day one closed: total_deposit={} daily_deposit={}",
        pool.total_deposit(),
        pool.daily_deposit(clock.now())
    );

    // day two: quotas unlock in proportion to day-one shares
    clock.advance(SECONDS_PER_DAY);
    for who in depositors.iter().chain(std::iter::once(&top)) {
        tracing::info!(
            "quota: account={} available={}",
            who,
            pool.available_to_exchange(&clock, who)?
        );
    }

    let redeemer = depositors[0];
    let cost = config
        .demo
        .redeem_amount
        .checked_mul(config.demo.token_price)
        .context("redemption cost overflows")?;
    tokens.credit(&token, redeemer, cost)?;
    tokens.approve(&token, &redeemer, &vault, cost)?;
    pool.buy(
        &clock,
        &native,
        &tokens,
        &board,
        redeemer,
        token,
        config.demo.redeem_amount,
    )?;
    tracing::info!(
        "redeemed: account={} amount={} cost={} native_received={}",
        redeemer,
        config.demo.redeem_amount,
        cost,
        native.balance_of(&redeemer)?
    );
    for who in depositors.iter().skip(1).chain(std::iter::once(&top)) {
        tracing::info!("reward: account={} native={}", who, native.balance_of(who)?);
    }

    for event in board.drain_events() {
        tracing::info!("exchange event: {}", event);
    }
    for event in pool.drain_events() {
        tracing::info!("pool event: {}", event);
    }
    tracing::info!(
        "pool summary: reserve={} total_deposit={} consumed_against_day_one={}",
        native.balance_of(&vault)?,
        pool.total_deposit(),
        pool.exchanged_daily(start)
    );
    Ok(())
}
