//! External Token Ledger
//!
//! Per-token balances and allowances of external token contracts. The
//! pool pulls payment with `transfer_from` against an allowance the buyer
//! granted to the vault beforehand, and pushes admin transfers with
//! `transfer`.

use std::collections::HashMap;
use std::sync::RwLock;

use lib_types::{Address, Amount, TokenId};

use crate::errors::{LedgerError, LedgerResult};

/// Minimal token-contract ledger interface
pub trait TokenLedger {
    /// Whether `token` resolves to a registered token contract
    fn is_contract(&self, token: &TokenId) -> bool;

    /// Current balance of an account in `token` units
    fn balance_of(&self, token: &TokenId, who: &Address) -> LedgerResult<Amount>;

    /// Remaining allowance `owner` has granted to `spender`
    fn allowance(&self, token: &TokenId, owner: &Address, spender: &Address)
        -> LedgerResult<Amount>;

    /// Grant `spender` the right to move up to `amount` of `owner`'s tokens
    fn approve(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> LedgerResult<()>;

    /// Move `amount` directly between accounts
    fn transfer(
        &self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()>;

    /// Move `amount` of `owner`'s tokens to `to`, spending `spender`'s allowance
    fn transfer_from(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()>;
}

/// Book state of a single registered token contract
#[derive(Debug, Default)]
struct TokenBook {
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), Amount>,
}

/// In-memory token ledger backing tests and the demo binary
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    books: RwLock<HashMap<TokenId, TokenBook>>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token contract; unknown tokens reject every operation
    pub fn register(&self, token: TokenId) -> LedgerResult<()> {
        let mut books = self.write_books()?;
        books.entry(token).or_default();
        Ok(())
    }

    /// Seed an account with token units
    pub fn credit(&self, token: &TokenId, who: Address, amount: Amount) -> LedgerResult<()> {
        let mut books = self.write_books()?;
        let book = books
            .get_mut(token)
            .ok_or(LedgerError::UnknownToken(*token))?;
        let balance = book.balances.entry(who).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn write_books(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, HashMap<TokenId, TokenBook>>> {
        self.books
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    fn read_books(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, HashMap<TokenId, TokenBook>>> {
        self.books
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }
}

fn move_balance(book: &mut TokenBook, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
    let from_balance = *book.balances.get(from).unwrap_or(&0);
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
    let to_balance = *book.balances.get(to).unwrap_or(&0);
    let new_to_balance = to_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;

    book.balances.insert(*from, from_balance - amount);
    book.balances.insert(*to, new_to_balance);
    Ok(())
}

impl TokenLedger for InMemoryTokenLedger {
    fn is_contract(&self, token: &TokenId) -> bool {
        self.read_books()
            .map(|books| books.contains_key(token))
            .unwrap_or(false)
    }

    fn balance_of(&self, token: &TokenId, who: &Address) -> LedgerResult<Amount> {
        let books = self.read_books()?;
        let book = books.get(token).ok_or(LedgerError::UnknownToken(*token))?;
        Ok(*book.balances.get(who).unwrap_or(&0))
    }

    fn allowance(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
    ) -> LedgerResult<Amount> {
        let books = self.read_books()?;
        let book = books.get(token).ok_or(LedgerError::UnknownToken(*token))?;
        Ok(*book.allowances.get(&(*owner, *spender)).unwrap_or(&0))
    }

    fn approve(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let mut books = self.write_books()?;
        let book = books
            .get_mut(token)
            .ok_or(LedgerError::UnknownToken(*token))?;
        book.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    fn transfer(
        &self,
        token: &TokenId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let mut books = self.write_books()?;
        let book = books
            .get_mut(token)
            .ok_or(LedgerError::UnknownToken(*token))?;
        move_balance(book, from, to, amount)
    }

    fn transfer_from(
        &self,
        token: &TokenId,
        owner: &Address,
        spender: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let mut books = self.write_books()?;
        let book = books
            .get_mut(token)
            .ok_or(LedgerError::UnknownToken(*token))?;

        let granted = *book.allowances.get(&(*owner, *spender)).unwrap_or(&0);
        if granted < amount {
            return Err(LedgerError::InsufficientAllowance {
                have: granted,
                need: amount,
            });
        }

        move_balance(book, owner, to, amount)?;
        book.allowances.insert((*owner, *spender), granted - amount);
        Ok(())
    }
}
