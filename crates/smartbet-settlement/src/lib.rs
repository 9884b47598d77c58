//! # smartbet-settlement
//!
//! **Finality Plane**: turning finished matches into winnings and winnings
//! into payouts.
//!
//! ## Architecture
//!
//! When a match finishes, [`SettlementEngine`]:
//! 1. Reads the match's bets through the per-match index
//! 2. Selects exact-score winners whose user slot is still current
//! 3. Computes credits under the configured [`PayoutPolicy`](smartbet_types::PayoutPolicy)
//! 4. Checks the solvency invariant against [`CustodyAccounting`] *before* writing
//! 5. Credits the winnings ledger
//!
//! Withdrawals go through the [`WithdrawalDesk`]: the winnings entry is
//! zeroed and a ticket issued before any funds move; the ticket is then
//! completed or rolled back exactly once.
//!
//! ## Solvency
//!
//! ```text
//! Σ winnings + Σ pending tickets ≤ Σ stakes received − Σ paid out
//! ```

pub mod custody;
pub mod payout;
pub mod withdrawal;

pub use custody::CustodyAccounting;
pub use payout::{Credit, SettlementEngine, SettlementPlan, SettlementReport};
pub use withdrawal::WithdrawalDesk;
