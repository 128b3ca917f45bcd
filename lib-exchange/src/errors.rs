//! Price Registry Errors

use lib_types::{Address, TokenId};
use thiserror::Error;

/// Error during a price registry operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Caller is not the registry owner: {0:?}")]
    NotOwner(Address),

    #[error("Not a registered token contract: {0:?}")]
    NonContract(TokenId),
}

/// Result type for price registry operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;
