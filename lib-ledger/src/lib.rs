//! Dexido External Collaborators
//!
//! The pool engine never holds funds and never reads the wall clock. It
//! drives three injected collaborators defined here:
//!
//! - [`Clock`]: the current timestamp, externally advanced
//! - [`NativeLedger`]: account-to-account native value movement
//! - [`TokenLedger`]: balances and allowances of external token contracts
//!
//! Every trait ships with an in-memory implementation used by tests and
//! the demo binary. Collaborator failures propagate into the enclosing
//! pool operation, which then aborts with no state change.

pub mod clock;
pub mod errors;
pub mod native;
pub mod tokens;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{LedgerError, LedgerResult};
pub use native::{InMemoryNativeLedger, NativeLedger};
pub use tokens::{InMemoryTokenLedger, TokenLedger};
