//! Token Price Registry
//!
//! Maps external token contracts to an exchange rate: how many token units
//! buy one native unit. Rates are set by the registry owner and read by
//! the pool when pricing a redemption. A rate of zero delists the token.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use lib_ledger::TokenLedger;
use lib_types::{Address, Amount, TokenId};

use crate::errors::{ExchangeError, ExchangeResult};

// ============================================================================
// EVENTS
// ============================================================================

/// Registry events for external consumption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    /// A token's exchange rate was set; `rate == 0` delists the token
    PriceChanged { token: TokenId, rate: Amount },
}

impl fmt::Display for ExchangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeEvent::PriceChanged { token, rate } => {
                write!(f, "PriceChanged(token={:?}, rate={})", token, rate)
            }
        }
    }
}

// ============================================================================
// PRICE BOARD
// ============================================================================

/// Owner-gated token price registry
///
/// Carries its own `Address` identity so a pool deployment can bind to it
/// and report the binding in its `Deployed` event.
#[derive(Debug, Serialize, Deserialize)]
pub struct PriceBoard {
    owner: Address,
    address: Address,
    prices: BTreeMap<TokenId, Amount>,
    events: Vec<ExchangeEvent>,
}

impl PriceBoard {
    pub fn new(owner: Address, address: Address) -> Self {
        Self {
            owner,
            address,
            prices: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Identity of this registry on the pool side
    pub fn address(&self) -> Address {
        self.address
    }

    /// Set the exchange rate of a token
    ///
    /// Owner-only. The token must resolve to a registered contract on the
    /// token ledger. `rate == 0` is a valid delist. Negative rates are
    /// unrepresentable by construction.
    pub fn set_price(
        &mut self,
        caller: Address,
        token: TokenId,
        rate: Amount,
        tokens: &dyn TokenLedger,
    ) -> ExchangeResult<()> {
        if caller != self.owner {
            return Err(ExchangeError::NotOwner(caller));
        }
        if !tokens.is_contract(&token) {
            return Err(ExchangeError::NonContract(token));
        }

        self.prices.insert(token, rate);
        self.events.push(ExchangeEvent::PriceChanged { token, rate });
        tracing::info!("price changed: token={:?} rate={}", token, rate);
        Ok(())
    }

    /// Last-set rate of a token; zero for unknown or delisted tokens
    pub fn price(&self, token: &TokenId) -> Amount {
        *self.prices.get(token).unwrap_or(&0)
    }

    /// Drain buffered events in emission order
    pub fn drain_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }
}
