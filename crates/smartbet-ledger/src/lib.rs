//! # smartbet-ledger
//!
//! **Envelope plane**: authoritative storage, caller policy, and the seams
//! to the outside world (funds and time).
//!
//! ## Architecture
//!
//! 1. **LedgerStore**: the four logical tables (Users, Matches, Bets,
//!    Winnings) plus the per-match bet index
//! 2. **AccessGuard**: owner / registered / banned checks, run before any write
//! 3. **FundsTransfer**: narrow deposit/withdraw/balance interface to the
//!    custody substrate, with [`InMemoryWallet`] as the in-process implementation
//! 4. **Clock**: the single source of "now" for betting cutoffs
//!
//! ```text
//! caller → AccessGuard.require_*() → (engine logic) → LedgerStore
//!                                          └──────────→ FundsTransfer
//! ```

pub mod access;
pub mod clock;
pub mod store;
pub mod transfer;

pub use access::AccessGuard;
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::LedgerStore;
pub use transfer::{FundsTransfer, InMemoryWallet};
