//! Dexido Price Registry
//!
//! An owner-gated board of token exchange rates, independent of the pool
//! that consumes it. A pool deployment binds to one board by address and
//! prices every redemption through [`PriceBoard::price`].
//!
//! # Usage
//!
//! ```ignore
//! use lib_exchange::PriceBoard;
//!
//! let mut board = PriceBoard::new(owner, board_address);
//! board.set_price(owner, usdt, 2, &tokens)?;
//! assert_eq!(board.price(&usdt), 2);
//! ```

pub mod errors;
pub mod registry;

pub use errors::{ExchangeError, ExchangeResult};
pub use registry::{ExchangeEvent, PriceBoard};
