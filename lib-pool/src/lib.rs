//! Dexido staking pool engine.
//!
//! Accounts stake native value into a deploy-once pool, accrue a daily
//! redemption quota one day in arrears, and redeem that quota against
//! external tokens priced by the exchange registry. A five-level referral
//! upline shares a slice of every redemption.

pub mod errors;
pub mod events;
pub mod pool;
pub mod quota;
pub mod referral;

pub use errors::{PoolError, PoolResult};
pub use events::PoolEvent;
pub use pool::{
    AccountState, DeployParams, Pool, PoolConfig, PoolPhase, MIN_DURATION, MIN_START_LEAD,
};
pub use referral::{split_reward, RewardSplit, MAX_REFERRAL_LEVELS, REWARD_SPLIT_PERCENT};
