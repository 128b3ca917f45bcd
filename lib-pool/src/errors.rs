//! Pool Error Types
//!
//! Every rejection carries its own variant so callers can assert the exact
//! cause. A failed operation leaves pool state and ledgers untouched.

use lib_ledger::LedgerError;
use lib_types::{Address, Amount, Permil, Timestamp, TokenId};
use thiserror::Error;

/// Error during a pool operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ============ AUTHORIZATION ============
    /// Caller is not the pool owner
    #[error("Caller is not the pool owner: {0}")]
    NotOwner(Address),

    // ============ LIFECYCLE ============
    /// Pool is stopped by the owner
    #[error("Pool is stopped")]
    Stopped,

    /// Pool has not been deployed yet
    #[error("Pool has not been deployed")]
    NotDeployed,

    /// Deploy may only happen once
    #[error("Pool has already been deployed")]
    AlreadyDeployed,

    /// Pool has not reached its start time
    #[error("Pool has not started: starts at {start}, now {now}")]
    NotStarted { start: Timestamp, now: Timestamp },

    /// Pool is past its end time
    #[error("Pool has ended: ended at {end}, now {now}")]
    Ended { end: Timestamp, now: Timestamp },

    /// Zero-amount withdraw probe while the pool is still running
    #[error("Pool is not over, amount is invalid")]
    PoolNotOver,

    // ============ VALIDATION ============
    /// Amount must be non-zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Deploy must be funded with native value
    #[error("Deploy funding must be greater than zero")]
    ZeroFunding,

    /// Start time must leave a minimum lead after deploy
    #[error("Start time is too soon: {start}, earliest {earliest}")]
    StartTooSoon { start: Timestamp, earliest: Timestamp },

    /// Duration must cover at least one full day
    #[error("Duration is too short: {duration}s, minimum {min}s")]
    DurationTooShort { duration: u64, min: u64 },

    /// Reward rate must lie strictly between 0 and 1000 permil
    #[error("Reward rate out of range: {0} permil")]
    RewardRateOutOfRange(Permil),

    /// Target is not a registered token contract
    #[error("Not a token contract: {0}")]
    NonContract(TokenId),

    /// Token has no price on the exchange board
    #[error("Token is not listed: {0}")]
    TokenNotListed(TokenId),

    // ============ REFERRAL GRAPH ============
    /// Depositing requires an accepted referrer (top is exempt)
    #[error("Account has no referrer")]
    NoReferrer,

    /// The referrer link is write-once
    #[error("Referrer has already been set")]
    ReferrerAlreadySet,

    /// An account cannot appear in its own upline
    #[error("Accounts cannot refer themselves")]
    SelfReferral,

    /// A referrer must hold live stake before it can be accepted
    #[error("Referrer has no stake: {0}")]
    ReferrerHasNoStake(Address),

    // ============ FUNDS ============
    /// Withdraw exceeds what the caller deposited today
    #[error("Amount deposited today is not enough: have {have}, need {need}")]
    InsufficientSameDayDeposit { have: Amount, need: Amount },

    /// Withdraw exceeds the caller's staked balance
    #[error("Staked balance is not enough: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    /// Redemption exceeds the caller's accrued exchange quota
    #[error("Exchange quota is not enough: have {have}, need {need}")]
    InsufficientQuota { have: Amount, need: Amount },

    /// The vault does not hold enough native value
    #[error("Pool reserve is not enough: have {have}, need {need}")]
    InsufficientReserve { have: Amount, need: Amount },

    /// The payer does not hold enough of the external token
    #[error("Token balance is not enough: have {have}, need {need}")]
    InsufficientTokenBalance { have: Amount, need: Amount },

    /// The caller has not approved enough of the external token
    #[error("Token allowance is not enough: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    // ============ ARITHMETIC ============
    /// Arithmetic overflow
    #[error("Arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow
    #[error("Arithmetic underflow")]
    Underflow,

    // ============ COLLABORATORS ============
    /// Error surfaced by a ledger backend
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
