//! Dexido primitives.
//! Stable, collaborator-neutral, behavior-free.
//!
//! Rule: No String identifiers in pool state. Ever.

pub mod primitives;
pub mod time;

pub use primitives::{Address, Amount, DayIndex, Permil, Timestamp, TokenId, PERMIL_SCALE};
pub use time::{day_index, days_in, SECONDS_PER_DAY};
