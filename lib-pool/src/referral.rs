//! Referral Reward Split
//!
//! Every redemption carves a reward pool out of the redeemed amount and
//! splits it across the buyer's upline. The split depends on how many
//! ancestors the buyer has; whatever the table leaves unassigned (absent
//! levels and integer-division dust) rolls up to the top beneficiary.
//!
//! This module is pure arithmetic. It never touches ledgers or pool state.

use serde::{Deserialize, Serialize};

use lib_types::{Amount, Permil, PERMIL_SCALE};

use crate::errors::{PoolError, PoolResult};

/// Upline levels that can ever earn a share of a redemption
pub const MAX_REFERRAL_LEVELS: usize = 5;

/// Percent of the reward pool paid to each upline level, nearest first
///
/// Row `n - 1` applies when the buyer has exactly `n` ancestors; five or
/// more ancestors use the last row. Rows sum to at most 100; the shortfall
/// goes to the top beneficiary.
pub const REWARD_SPLIT_PERCENT: [&[u64]; MAX_REFERRAL_LEVELS] = [
    &[80],
    &[60, 20],
    &[40, 20, 20],
    &[20, 20, 20, 20],
    &[20, 20, 20, 20, 20],
];

/// Full payout breakdown of one redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    /// Native amount being redeemed
    amount: Amount,
    /// Slice of `amount` withheld for referral rewards
    reward_pool: Amount,
    /// What the buyer receives: `amount - reward_pool`
    net: Amount,
    /// Reward per upline level, nearest ancestor first
    shares: Vec<Amount>,
    /// Reward for the top beneficiary, including rounding dust
    top: Amount,
}

impl RewardSplit {
    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn reward_pool(&self) -> Amount {
        self.reward_pool
    }

    pub fn net(&self) -> Amount {
        self.net
    }

    pub fn shares(&self) -> &[Amount] {
        &self.shares
    }

    pub fn top(&self) -> Amount {
        self.top
    }

    /// Total native value leaving the vault for this redemption
    pub fn total_paid(&self) -> Amount {
        let mut total = self.net.saturating_add(self.top);
        for share in &self.shares {
            total = total.saturating_add(*share);
        }
        total
    }
}

/// Split a redemption of `amount` at `rate` permil across `ancestors` levels
///
/// The reward pool is `amount * rate / 1000`, floored. Each populated level
/// receives its table percentage of the pool, floored; the remainder goes
/// to the top beneficiary, so the split always conserves the pool exactly.
pub fn split_reward(amount: Amount, rate: Permil, ancestors: usize) -> PoolResult<RewardSplit> {
    let reward_pool = amount
        .checked_mul(rate as Amount)
        .ok_or(PoolError::Overflow)?
        / PERMIL_SCALE as Amount;
    let net = amount.checked_sub(reward_pool).ok_or(PoolError::Underflow)?;

    let mut shares = Vec::new();
    let mut distributed: Amount = 0;
    if ancestors > 0 {
        let row = REWARD_SPLIT_PERCENT[ancestors.min(MAX_REFERRAL_LEVELS) - 1];
        for &percent in row {
            let share = reward_pool
                .checked_mul(percent as Amount)
                .ok_or(PoolError::Overflow)?
                / 100;
            distributed = distributed.checked_add(share).ok_or(PoolError::Overflow)?;
            shares.push(share);
        }
    }
    let top = reward_pool
        .checked_sub(distributed)
        .ok_or(PoolError::Underflow)?;

    Ok(RewardSplit {
        amount,
        reward_pool,
        net,
        shares,
        top,
    })
}

// ============ TESTS ============

#[cfg(test)]
mod tests {
    use super::*;

    fn split(amount: Amount, ancestors: usize) -> RewardSplit {
        split_reward(amount, 50, ancestors).unwrap()
    }

    #[test]
    fn table_rows_never_exceed_full_pool() {
        for (index, row) in REWARD_SPLIT_PERCENT.iter().enumerate() {
            assert_eq!(row.len(), index + 1);
            let total: u64 = row.iter().sum();
            assert!(total <= 100, "row {} distributes {}%", index + 1, total);
        }
    }

    #[test]
    fn one_ancestor_pays_eighty_twenty() {
        let split = split(2_000, 1);
        assert_eq!(split.reward_pool(), 100);
        assert_eq!(split.net(), 1_900);
        assert_eq!(split.shares(), &[80]);
        assert_eq!(split.top(), 20);
    }

    #[test]
    fn two_ancestors_pay_sixty_twenty_twenty() {
        let split = split(2_000, 2);
        assert_eq!(split.shares(), &[60, 20]);
        assert_eq!(split.top(), 20);
    }

    #[test]
    fn three_ancestors_pay_forty_and_two_twenties() {
        let split = split(2_000, 3);
        assert_eq!(split.shares(), &[40, 20, 20]);
        assert_eq!(split.top(), 20);
    }

    #[test]
    fn four_ancestors_pay_four_twenties() {
        let split = split(2_000, 4);
        assert_eq!(split.shares(), &[20, 20, 20, 20]);
        assert_eq!(split.top(), 20);
    }

    #[test]
    fn five_ancestors_leave_nothing_for_top() {
        let split = split(2_000, 5);
        assert_eq!(split.shares(), &[20, 20, 20, 20, 20]);
        assert_eq!(split.top(), 0);
    }

    #[test]
    fn deeper_uplines_clamp_to_five_levels() {
        let five = split(2_000, 5);
        let nine = split(2_000, 9);
        assert_eq!(five, nine);
    }

    #[test]
    fn no_ancestors_sends_whole_pool_to_top() {
        let split = split(2_000, 0);
        assert!(split.shares().is_empty());
        assert_eq!(split.top(), 100);
        assert_eq!(split.net(), 1_900);
    }

    #[test]
    fn rounding_dust_rolls_up_to_top() {
        // reward pool 101: 80% floors to 80, leaving 21 for top
        let split = split(2_020, 1);
        assert_eq!(split.reward_pool(), 101);
        assert_eq!(split.shares(), &[80]);
        assert_eq!(split.top(), 21);
    }

    #[test]
    fn zero_amount_splits_to_zeros() {
        let split = split(0, 3);
        assert_eq!(split.reward_pool(), 0);
        assert_eq!(split.net(), 0);
        assert_eq!(split.shares(), &[0, 0, 0]);
        assert_eq!(split.top(), 0);
    }

    #[test]
    fn split_conserves_amount_exactly() {
        for amount in [1u128, 7, 999, 2_000, 2_020, 123_457, 1_000_000_001] {
            for rate in [1u16, 50, 333, 999] {
                for ancestors in 0..=7usize {
                    let split = split_reward(amount, rate, ancestors).unwrap();
                    let levels: Amount = split.shares().iter().sum();
                    assert_eq!(
                        split.net() + levels + split.top(),
                        amount,
                        "amount={} rate={} ancestors={}",
                        amount,
                        rate,
                        ancestors
                    );
                    assert_eq!(split.total_paid(), amount);
                }
            }
        }
    }

    #[test]
    fn rate_is_applied_permil() {
        let split = split_reward(10_000, 333, 0).unwrap();
        assert_eq!(split.reward_pool(), 3_330);
        assert_eq!(split.net(), 6_670);
    }
}
