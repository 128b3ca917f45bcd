//! Native Value Ledger
//!
//! Account-to-account movement of the native currency. The pool fixes one
//! side of every transfer to its own vault address: deposits transfer in
//! from the caller, withdrawals and payouts transfer out of the vault.

use std::collections::HashMap;
use std::sync::RwLock;

use lib_types::{Address, Amount};

use crate::errors::{LedgerError, LedgerResult};

/// Minimal native-currency ledger interface
///
/// Implementations must apply each transfer atomically and fail loudly;
/// the enclosing pool operation aborts on any error.
pub trait NativeLedger {
    /// Current balance of an account
    fn balance_of(&self, who: &Address) -> LedgerResult<Amount>;

    /// Move `amount` from one account to another
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()>;
}

/// In-memory native ledger backing tests and the demo binary
///
/// Interior `RwLock` keeps balance reads concurrent and transfers
/// exclusive.
#[derive(Debug, Default)]
pub struct InMemoryNativeLedger {
    balances: RwLock<HashMap<Address, Amount>>,
}

impl InMemoryNativeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with funds
    pub fn credit(&self, who: Address, amount: Amount) -> LedgerResult<()> {
        let mut balances = self
            .balances
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        let balance = balances.entry(who).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

impl NativeLedger for InMemoryNativeLedger {
    fn balance_of(&self, who: &Address) -> LedgerResult<Amount> {
        let balances = self
            .balances
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(*balances.get(who).unwrap_or(&0))
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let mut balances = self
            .balances
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let from_balance = *balances.get(from).unwrap_or(&0);
        if from_balance < amount {
            return Err(LedgerError::InsufficientFunds {
                have: from_balance,
                need: amount,
            });
        }
        // Self-transfer is a funded no-op, not a mint
        if from == to {
            return Ok(());
        }

        let to_balance = *balances.get(to).unwrap_or(&0);
        let new_to_balance = to_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;

        balances.insert(*from, from_balance - amount);
        balances.insert(*to, new_to_balance);
        Ok(())
    }
}
