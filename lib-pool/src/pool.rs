//! IDO Staking Pool
//!
//! The pool aggregate owns every piece of staking state: per-account
//! balances and referral links, per-day deposit and redemption ledgers,
//! and the deploy-once configuration. Ledgers and the clock arrive as
//! collaborators on each call, so the aggregate itself is plain
//! serializable state.
//!
//! Every mutating operation validates in full before it moves funds, and
//! commits its own state only after the ledgers accepted the movement. A
//! failed operation leaves nothing behind.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use lib_exchange::PriceBoard;
use lib_ledger::{Clock, NativeLedger, TokenLedger};
use lib_types::{
    day_index, days_in, Address, Amount, DayIndex, Permil, Timestamp, TokenId, PERMIL_SCALE,
    SECONDS_PER_DAY,
};

use crate::errors::{PoolError, PoolResult};
use crate::events::PoolEvent;
use crate::quota;
use crate::referral::{self, MAX_REFERRAL_LEVELS};

/// Minimum lead between deploy and pool start
pub const MIN_START_LEAD: u64 = 60;

/// Minimum pool duration
pub const MIN_DURATION: u64 = SECONDS_PER_DAY;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Parameters requested at deploy time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParams {
    /// First instant the pool accepts deposits
    pub start: Timestamp,
    /// Pool lifetime in seconds, whole days
    pub duration: u64,
    /// Slice of every redemption withheld for referral rewards, permil
    pub reward_rate_permil: Permil,
    /// Price registry this pool reads
    pub oracle: Address,
    /// Root of the referral tree and sink for unassigned rewards
    pub top: Address,
}

/// Immutable parameters fixed by a successful deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub start: Timestamp,
    pub duration: u64,
    /// Native funding locked in at deploy
    pub total: Amount,
    /// Redemption budget emitted per pool day: `total / days`
    pub daily_limit: Amount,
    pub reward_rate_permil: Permil,
    pub oracle: Address,
    pub top: Address,
}

impl PoolConfig {
    /// Exclusive end instant
    pub fn end(&self) -> Timestamp {
        self.start.saturating_add(self.duration)
    }

    /// Number of whole emission days
    pub fn days(&self) -> u64 {
        days_in(self.duration)
    }

    pub fn phase_at(&self, now: Timestamp) -> PoolPhase {
        if now < self.start {
            PoolPhase::Pending
        } else if now < self.end() {
            PoolPhase::Active
        } else {
            PoolPhase::Ended
        }
    }
}

/// Pool lifecycle position, derived purely from the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolPhase {
    Pending,
    Active,
    Ended,
}

// ============================================================================
// ACCOUNT STATE
// ============================================================================

/// Per-account staking state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Live staked balance
    pub balance: Amount,
    /// Upline link, write-once
    pub referrer: Option<Address>,
    /// Native deposited per pool day
    pub daily_deposit: BTreeMap<DayIndex, Amount>,
    /// Quota consumed per pool day it accrued from
    pub daily_exchanged: BTreeMap<DayIndex, Amount>,
}

// ============================================================================
// POOL AGGREGATE
// ============================================================================

/// The staking pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    owner: Address,
    /// Account holding the pool's native reserve and pulled token costs
    vault: Address,
    stopped: bool,
    config: Option<PoolConfig>,
    accounts: HashMap<Address, AccountState>,
    /// Sum of all live staked balances
    total_deposit: Amount,
    /// Global native deposited per pool day
    daily_deposits: BTreeMap<DayIndex, Amount>,
    /// Global quota consumed per pool day it accrued from
    daily_exchanged: BTreeMap<DayIndex, Amount>,
    events: Vec<PoolEvent>,
}

impl Pool {
    /// Undeployed pool controlled by `owner`, holding funds at `vault`
    pub fn new(owner: Address, vault: Address) -> Self {
        Self {
            owner,
            vault,
            stopped: false,
            config: None,
            accounts: HashMap::new(),
            total_deposit: 0,
            daily_deposits: BTreeMap::new(),
            daily_exchanged: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    // ============ VIEWS ============

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn vault(&self) -> Address {
        self.vault
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn deployed(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&PoolConfig> {
        self.config.as_ref()
    }

    /// Start instant; zero before deploy
    pub fn pool_start(&self) -> Timestamp {
        self.config.map(|c| c.start).unwrap_or(0)
    }

    /// Lifetime in seconds; zero before deploy
    pub fn pool_duration(&self) -> u64 {
        self.config.map(|c| c.duration).unwrap_or(0)
    }

    /// Native funding locked at deploy; zero before deploy
    pub fn pool_total(&self) -> Amount {
        self.config.map(|c| c.total).unwrap_or(0)
    }

    /// Per-day redemption budget; zero before deploy
    pub fn pool_daily_limit(&self) -> Amount {
        self.config.map(|c| c.daily_limit).unwrap_or(0)
    }

    /// Reward withholding rate in permil; zero before deploy
    pub fn reward_rate_permil(&self) -> Permil {
        self.config.map(|c| c.reward_rate_permil).unwrap_or(0)
    }

    /// Lifecycle position; `None` before deploy
    pub fn phase(&self, clock: &dyn Clock) -> Option<PoolPhase> {
        self.config.map(|c| c.phase_at(clock.now()))
    }

    /// Sum of all live staked balances
    pub fn total_deposit(&self) -> Amount {
        self.total_deposit
    }

    /// Live staked balance of one account
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.accounts.get(account).map(|a| a.balance).unwrap_or(0)
    }

    /// Upline link of one account
    pub fn referrer_of(&self, account: &Address) -> Option<Address> {
        self.accounts.get(account).and_then(|a| a.referrer)
    }

    /// Global native deposited on the day containing `at`
    pub fn daily_deposit(&self, at: Timestamp) -> Amount {
        self.day_of(at)
            .and_then(|day| self.daily_deposits.get(&day))
            .copied()
            .unwrap_or(0)
    }

    /// Native one account deposited on the day containing `at`
    pub fn daily_deposit_of(&self, at: Timestamp, account: &Address) -> Amount {
        match (self.day_of(at), self.accounts.get(account)) {
            (Some(day), Some(state)) => state.daily_deposit.get(&day).copied().unwrap_or(0),
            _ => 0,
        }
    }

    /// Global quota consumed against the day containing `at`
    pub fn exchanged_daily(&self, at: Timestamp) -> Amount {
        self.day_of(at)
            .and_then(|day| self.daily_exchanged.get(&day))
            .copied()
            .unwrap_or(0)
    }

    /// Redemption quota the account has accrued and not yet consumed
    ///
    /// Quota comes from completed days only; deposits made today start
    /// counting tomorrow. Zero before deploy and before the pool starts.
    pub fn available_to_exchange(
        &self,
        clock: &dyn Clock,
        account: &Address,
    ) -> PoolResult<Amount> {
        let config = match self.config {
            Some(config) => config,
            None => return Ok(0),
        };
        let today = match day_index(config.start, clock.now()) {
            Some(day) => day,
            None => return Ok(0),
        };
        match self.accounts.get(account) {
            Some(state) => quota::available(
                config.daily_limit,
                &state.daily_deposit,
                &self.daily_deposits,
                &state.daily_exchanged,
                today,
            ),
            None => Ok(0),
        }
    }

    /// Drain buffered events in emission order
    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    // ============ LIFECYCLE ============

    /// Fund and activate the pool; one shot, owner only
    ///
    /// `funded` native moves from the owner into the vault and fixes the
    /// emission schedule: `daily_limit = funded / whole_days(duration)`.
    pub fn deploy(
        &mut self,
        clock: &dyn Clock,
        native: &dyn NativeLedger,
        caller: Address,
        params: DeployParams,
        funded: Amount,
    ) -> PoolResult<()> {
        self.require_live()?;
        self.require_owner(&caller)?;
        if self.config.is_some() {
            return Err(PoolError::AlreadyDeployed);
        }
        if funded == 0 {
            return Err(PoolError::ZeroFunding);
        }
        let now = clock.now();
        let earliest = now.checked_add(MIN_START_LEAD).ok_or(PoolError::Overflow)?;
        if params.start < earliest {
            return Err(PoolError::StartTooSoon {
                start: params.start,
                earliest,
            });
        }
        if params.duration < MIN_DURATION {
            return Err(PoolError::DurationTooShort {
                duration: params.duration,
                min: MIN_DURATION,
            });
        }
        if params.reward_rate_permil == 0 || params.reward_rate_permil >= PERMIL_SCALE {
            return Err(PoolError::RewardRateOutOfRange(params.reward_rate_permil));
        }
        params
            .start
            .checked_add(params.duration)
            .ok_or(PoolError::Overflow)?;
        let daily_limit = funded / days_in(params.duration) as Amount;

        native.transfer(&caller, &self.vault, funded)?;

        let config = PoolConfig {
            start: params.start,
            duration: params.duration,
            total: funded,
            daily_limit,
            reward_rate_permil: params.reward_rate_permil,
            oracle: params.oracle,
            top: params.top,
        };
        self.config = Some(config);
        self.events.push(PoolEvent::Deployed {
            start: config.start,
            duration: config.duration,
            total: config.total,
            daily_limit: config.daily_limit,
            reward_rate_permil: config.reward_rate_permil,
            owner: self.owner,
            oracle: config.oracle,
            top: config.top,
        });
        tracing::info!(
            "pool deployed: start={} duration={}s total={} daily_limit={}",
            config.start,
            config.duration,
            config.total,
            config.daily_limit
        );
        Ok(())
    }

    /// Halt deposits, withdrawals, redemptions and deploy; owner only
    pub fn stop(&mut self, caller: Address) -> PoolResult<()> {
        self.require_owner(&caller)?;
        self.stopped = true;
        tracing::info!("pool stopped");
        Ok(())
    }

    /// Lift a stop; owner only
    pub fn resume(&mut self, caller: Address) -> PoolResult<()> {
        self.require_owner(&caller)?;
        self.stopped = false;
        tracing::info!("pool resumed");
        Ok(())
    }

    // ============ REFERRAL ============

    /// Bind the caller under `referrer`, write-once
    ///
    /// The referrer must already hold live stake, and the link may not
    /// close a loop: the graph stays a forest rooted at `top`.
    pub fn accept(&mut self, caller: Address, referrer: Address) -> PoolResult<()> {
        if self.referrer_of(&caller).is_some() {
            return Err(PoolError::ReferrerAlreadySet);
        }
        if referrer == caller {
            return Err(PoolError::SelfReferral);
        }
        if self.balance_of(&referrer) == 0 {
            return Err(PoolError::ReferrerHasNoStake(referrer));
        }
        let mut cursor = Some(referrer);
        while let Some(node) = cursor {
            if node == caller {
                return Err(PoolError::SelfReferral);
            }
            cursor = self.referrer_of(&node);
        }
        self.accounts.entry(caller).or_default().referrer = Some(referrer);
        tracing::debug!("accept: account={} referrer={}", caller, referrer);
        Ok(())
    }

    // ============ STAKING ============

    /// Stake native value into the pool
    ///
    /// Requires an accepted referrer unless the caller is `top`. The
    /// deposit lands in today's bucket and starts earning redemption
    /// quota tomorrow.
    pub fn deposit(
        &mut self,
        clock: &dyn Clock,
        native: &dyn NativeLedger,
        caller: Address,
        amount: Amount,
    ) -> PoolResult<()> {
        self.require_live()?;
        let now = clock.now();
        let (config, today) = self.running(now)?;
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if self.referrer_of(&caller).is_none() && caller != config.top {
            return Err(PoolError::NoReferrer);
        }

        let new_balance = self
            .balance_of(&caller)
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        let new_total = self
            .total_deposit
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        let own_day = self
            .accounts
            .get(&caller)
            .and_then(|a| a.daily_deposit.get(&today))
            .copied()
            .unwrap_or(0);
        let new_own_day = own_day.checked_add(amount).ok_or(PoolError::Overflow)?;
        let global_day = self.daily_deposits.get(&today).copied().unwrap_or(0);
        let new_global_day = global_day.checked_add(amount).ok_or(PoolError::Overflow)?;

        native.transfer(&caller, &self.vault, amount)?;

        let account = self.accounts.entry(caller).or_default();
        account.balance = new_balance;
        account.daily_deposit.insert(today, new_own_day);
        self.daily_deposits.insert(today, new_global_day);
        self.total_deposit = new_total;
        self.events.push(PoolEvent::Deposited {
            account: caller,
            amount,
        });
        tracing::debug!("deposit: account={} amount={} day={}", caller, amount, today);
        Ok(())
    }

    /// Take staked native value back out
    ///
    /// While the pool runs, only value deposited today is reversible; a
    /// zero amount is the standing probe and fails on its own. After the
    /// end time any amount up to the live balance goes.
    pub fn withdraw(
        &mut self,
        clock: &dyn Clock,
        native: &dyn NativeLedger,
        caller: Address,
        amount: Amount,
    ) -> PoolResult<()> {
        self.require_live()?;
        let now = clock.now();
        let config = self.config.ok_or(PoolError::NotDeployed)?;

        if now < config.end() {
            if amount == 0 {
                return Err(PoolError::PoolNotOver);
            }
            let today = match day_index(config.start, now) {
                Some(day) => day,
                None => {
                    return Err(PoolError::InsufficientSameDayDeposit {
                        have: 0,
                        need: amount,
                    })
                }
            };
            let own_today = self
                .accounts
                .get(&caller)
                .and_then(|a| a.daily_deposit.get(&today))
                .copied()
                .unwrap_or(0);
            if own_today < amount {
                return Err(PoolError::InsufficientSameDayDeposit {
                    have: own_today,
                    need: amount,
                });
            }
            let new_balance = self
                .balance_of(&caller)
                .checked_sub(amount)
                .ok_or(PoolError::Underflow)?;
            let new_total = self
                .total_deposit
                .checked_sub(amount)
                .ok_or(PoolError::Underflow)?;
            let new_global_day = self
                .daily_deposits
                .get(&today)
                .copied()
                .unwrap_or(0)
                .checked_sub(amount)
                .ok_or(PoolError::Underflow)?;

            native.transfer(&self.vault, &caller, amount)?;

            let account = self.accounts.entry(caller).or_default();
            account.balance = new_balance;
            account.daily_deposit.insert(today, own_today - amount);
            self.daily_deposits.insert(today, new_global_day);
            self.total_deposit = new_total;
        } else {
            if amount == 0 {
                return Err(PoolError::ZeroAmount);
            }
            let balance = self.balance_of(&caller);
            if balance < amount {
                return Err(PoolError::InsufficientBalance {
                    have: balance,
                    need: amount,
                });
            }
            let new_total = self
                .total_deposit
                .checked_sub(amount)
                .ok_or(PoolError::Underflow)?;

            native.transfer(&self.vault, &caller, amount)?;

            if let Some(account) = self.accounts.get_mut(&caller) {
                account.balance = balance - amount;
            }
            self.total_deposit = new_total;
        }
        self.events.push(PoolEvent::Withdrawn {
            account: caller,
            amount,
        });
        tracing::debug!("withdraw: account={} amount={}", caller, amount);
        Ok(())
    }

    // ============ REDEMPTION ============

    /// Redeem accrued quota: pay `amount * price` in `token`, receive
    /// `amount` native minus the referral withholding
    ///
    /// The withheld slice is split across the caller's upline per the
    /// reward table; absent levels and rounding dust go to `top`. The
    /// token cost is pulled through the caller's allowance to the vault.
    #[allow(clippy::too_many_arguments)]
    pub fn buy(
        &mut self,
        clock: &dyn Clock,
        native: &dyn NativeLedger,
        tokens: &dyn TokenLedger,
        board: &PriceBoard,
        caller: Address,
        token: TokenId,
        amount: Amount,
    ) -> PoolResult<()> {
        self.require_live()?;
        let now = clock.now();
        let (config, today) = self.running(now)?;
        if !tokens.is_contract(&token) {
            return Err(PoolError::NonContract(token));
        }
        let price = board.price(&token);
        if price == 0 {
            return Err(PoolError::TokenNotListed(token));
        }
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let cost = amount.checked_mul(price).ok_or(PoolError::Overflow)?;

        let reserve = native.balance_of(&self.vault)?;
        if reserve < amount {
            return Err(PoolError::InsufficientReserve {
                have: reserve,
                need: amount,
            });
        }
        let holding = tokens.balance_of(&token, &caller)?;
        if holding < cost {
            return Err(PoolError::InsufficientTokenBalance {
                have: holding,
                need: cost,
            });
        }
        let granted = tokens.allowance(&token, &caller, &self.vault)?;
        if granted < cost {
            return Err(PoolError::InsufficientAllowance {
                have: granted,
                need: cost,
            });
        }

        let fallback = AccountState::default();
        let account = self.accounts.get(&caller).unwrap_or(&fallback);
        let plan = quota::consume(
            config.daily_limit,
            &account.daily_deposit,
            &self.daily_deposits,
            &account.daily_exchanged,
            today,
            amount,
        )?;
        let upline = self.upline_of(&caller, MAX_REFERRAL_LEVELS);
        let split = referral::split_reward(amount, config.reward_rate_permil, upline.len())?;

        // every check passed: pull the cost, then fan out the payouts
        tokens.transfer_from(&token, &caller, &self.vault, &self.vault, cost)?;

        let mut payouts: Vec<(Address, Amount)> = Vec::with_capacity(upline.len() + 2);
        payouts.push((caller, split.net()));
        for (level, share) in upline.iter().zip(split.shares()) {
            payouts.push((*level, *share));
        }
        payouts.push((config.top, split.top()));

        let mut paid: Vec<(Address, Amount)> = Vec::new();
        for (to, value) in payouts {
            if value == 0 {
                continue;
            }
            if let Err(err) = native.transfer(&self.vault, &to, value) {
                self.reverse_payouts(native, tokens, &token, &caller, cost, &paid);
                return Err(err.into());
            }
            paid.push((to, value));
        }

        let account = self.accounts.entry(caller).or_default();
        for (day, take) in &plan {
            let own = account.daily_exchanged.entry(*day).or_insert(0);
            *own = own.saturating_add(*take);
            let global = self.daily_exchanged.entry(*day).or_insert(0);
            *global = global.saturating_add(*take);
        }
        tracing::debug!(
            "buy: account={} token={} amount={} cost={} levels={}",
            caller,
            token,
            amount,
            cost,
            upline.len()
        );
        Ok(())
    }

    // ============ ADMINISTRATION ============

    /// Move stray external tokens out of the vault; owner only
    pub fn transfer(
        &self,
        tokens: &dyn TokenLedger,
        caller: Address,
        token: TokenId,
        recipient: Address,
        amount: Amount,
    ) -> PoolResult<()> {
        self.require_owner(&caller)?;
        if !tokens.is_contract(&token) {
            return Err(PoolError::NonContract(token));
        }
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let held = tokens.balance_of(&token, &self.vault)?;
        if held < amount {
            return Err(PoolError::InsufficientTokenBalance {
                have: held,
                need: amount,
            });
        }
        tokens.transfer(&token, &self.vault, &recipient, amount)?;
        tracing::info!(
            "admin token transfer: token={} to={} amount={}",
            token,
            recipient,
            amount
        );
        Ok(())
    }

    /// Move native reserve out of the vault; owner only
    pub fn refund(
        &self,
        native: &dyn NativeLedger,
        caller: Address,
        recipient: Address,
        amount: Amount,
    ) -> PoolResult<()> {
        self.require_owner(&caller)?;
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let reserve = native.balance_of(&self.vault)?;
        if reserve < amount {
            return Err(PoolError::InsufficientReserve {
                have: reserve,
                need: amount,
            });
        }
        native.transfer(&self.vault, &recipient, amount)?;
        tracing::info!("admin refund: to={} amount={}", recipient, amount);
        Ok(())
    }

    // ============ INTERNAL ============

    fn require_owner(&self, caller: &Address) -> PoolResult<()> {
        if *caller != self.owner {
            return Err(PoolError::NotOwner(*caller));
        }
        Ok(())
    }

    fn require_live(&self) -> PoolResult<()> {
        if self.stopped {
            return Err(PoolError::Stopped);
        }
        Ok(())
    }

    /// Config and current day index while the pool accepts activity
    fn running(&self, now: Timestamp) -> PoolResult<(PoolConfig, DayIndex)> {
        let config = self.config.ok_or(PoolError::NotDeployed)?;
        match config.phase_at(now) {
            PoolPhase::Pending => Err(PoolError::NotStarted {
                start: config.start,
                now,
            }),
            PoolPhase::Ended => Err(PoolError::Ended {
                end: config.end(),
                now,
            }),
            PoolPhase::Active => Ok((config, day_index(config.start, now).unwrap_or(0))),
        }
    }

    fn day_of(&self, at: Timestamp) -> Option<DayIndex> {
        self.config.and_then(|c| day_index(c.start, at))
    }

    /// Upline chain of `account`, nearest ancestor first, at most `cap` long
    fn upline_of(&self, account: &Address, cap: usize) -> Vec<Address> {
        let mut chain = Vec::new();
        let mut cursor = self.referrer_of(account);
        while let Some(node) = cursor {
            if chain.len() == cap {
                break;
            }
            chain.push(node);
            cursor = self.referrer_of(&node);
        }
        chain
    }

    /// Best-effort reversal after a payout fault partway through a buy
    fn reverse_payouts(
        &self,
        native: &dyn NativeLedger,
        tokens: &dyn TokenLedger,
        token: &TokenId,
        buyer: &Address,
        cost: Amount,
        paid: &[(Address, Amount)],
    ) {
        for (to, value) in paid {
            if let Err(err) = native.transfer(to, &self.vault, *value) {
                tracing::error!("payout reversal failed: to={} amount={}: {}", to, value, err);
            }
        }
        if let Err(err) = tokens.transfer(token, &self.vault, buyer, cost) {
            tracing::error!(
                "cost reversal failed: buyer={} amount={}: {}",
                buyer,
                cost,
                err
            );
        }
    }
}

// ============ TESTS ============
