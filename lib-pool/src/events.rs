//! Pool Events
//!
//! Mutating operations append events to an in-memory buffer; the embedding
//! application drains the buffer and forwards events wherever it wants.

use serde::{Deserialize, Serialize};
use std::fmt;

use lib_types::{Address, Amount, Permil, Timestamp};

/// Events emitted by the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    /// Pool went live with its resolved parameters
    Deployed {
        start: Timestamp,
        duration: u64,
        total: Amount,
        daily_limit: Amount,
        reward_rate_permil: Permil,
        owner: Address,
        oracle: Address,
        top: Address,
    },
    /// An account staked native value
    Deposited { account: Address, amount: Amount },
    /// An account took native value back out
    Withdrawn { account: Address, amount: Amount },
}

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolEvent::Deployed {
                start,
                duration,
                total,
                daily_limit,
                ..
            } => write!(
                f,
                "Deployed(start={}, duration={}s, total={}, daily_limit={})",
                start, duration, total, daily_limit
            ),
            PoolEvent::Deposited { account, amount } => {
                write!(f, "Deposited(account={}, amount={})", account, amount)
            }
            PoolEvent::Withdrawn { account, amount } => {
                write!(f, "Withdrawn(account={}, amount={})", account, amount)
            }
        }
    }
}
