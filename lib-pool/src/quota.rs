//! Exchange Quota Accrual
//!
//! Quota accrues one day in arrears: every completed pool day in which an
//! account deposited grants it a slice of that day's emission budget,
//! proportional to its share of the day's global deposits. Quota never
//! expires while the pool runs; redemptions consume it oldest day first.
//!
//! Pure functions over the daily ledgers. The pool aggregate owns the maps
//! and applies the plans returned here.

use std::collections::BTreeMap;

use lib_types::{Amount, DayIndex};

use crate::errors::{PoolError, PoolResult};

/// Quota granted to one account for one completed day
///
/// `own <= global` always holds, so the result never exceeds `daily_limit`.
fn day_quota(daily_limit: Amount, own: Amount, global: Amount) -> PoolResult<Amount> {
    Ok(daily_limit
        .checked_mul(own)
        .ok_or(PoolError::Overflow)?
        / global)
}

/// Unredeemed quota left on one day
fn day_free(
    daily_limit: Amount,
    own: Amount,
    global: Amount,
    spent: Amount,
) -> PoolResult<Amount> {
    let quota = day_quota(daily_limit, own, global)?;
    quota.checked_sub(spent).ok_or(PoolError::Underflow)
}

/// Total quota redeemable from days strictly before `today`
pub fn available(
    daily_limit: Amount,
    own_deposits: &BTreeMap<DayIndex, Amount>,
    global_deposits: &BTreeMap<DayIndex, Amount>,
    own_exchanged: &BTreeMap<DayIndex, Amount>,
    today: DayIndex,
) -> PoolResult<Amount> {
    let mut total: Amount = 0;
    for (&day, &own) in own_deposits.range(..today) {
        if own == 0 {
            continue;
        }
        let global = global_deposits.get(&day).copied().unwrap_or(0);
        if global == 0 {
            continue;
        }
        let spent = own_exchanged.get(&day).copied().unwrap_or(0);
        let free = day_free(daily_limit, own, global, spent)?;
        total = total.checked_add(free).ok_or(PoolError::Overflow)?;
    }
    Ok(total)
}

/// Allocate a redemption of `amount` against per-day quota, oldest day first
///
/// Returns the per-day consumption plan. Fails with the total still
/// available when the accrued quota cannot cover `amount`.
pub fn consume(
    daily_limit: Amount,
    own_deposits: &BTreeMap<DayIndex, Amount>,
    global_deposits: &BTreeMap<DayIndex, Amount>,
    own_exchanged: &BTreeMap<DayIndex, Amount>,
    today: DayIndex,
    amount: Amount,
) -> PoolResult<Vec<(DayIndex, Amount)>> {
    let mut remaining = amount;
    let mut plan = Vec::new();
    for (&day, &own) in own_deposits.range(..today) {
        if own == 0 {
            continue;
        }
        let global = global_deposits.get(&day).copied().unwrap_or(0);
        if global == 0 {
            continue;
        }
        let spent = own_exchanged.get(&day).copied().unwrap_or(0);
        let free = day_free(daily_limit, own, global, spent)?;
        if free == 0 {
            continue;
        }
        let take = free.min(remaining);
        if take > 0 {
            plan.push((day, take));
            remaining -= take;
        }
        if remaining == 0 {
            break;
        }
    }
    if remaining > 0 {
        // the walk drained every eligible day, so the allocated total is
        // exactly what the account had available
        return Err(PoolError::InsufficientQuota {
            have: amount - remaining,
            need: amount,
        });
    }
    Ok(plan)
}

// ============ TESTS ============
