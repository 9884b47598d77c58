//! # smartbet-types
//!
//! Shared types, errors, and configuration for the **SmartBet** wagering engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Principal`], [`MatchId`], [`BetId`], [`TicketId`]
//! - **User model**: [`User`]
//! - **Match model**: [`Match`], [`MatchStatus`], [`Scoreline`]
//! - **Bet model**: [`Bet`]
//! - **Withdrawal model**: [`WithdrawalTicket`], [`TicketState`]
//! - **Events**: [`Event`], [`EventRecord`]
//! - **Configuration**: [`EngineConfig`], [`PayoutPolicy`]
//! - **Errors**: [`SmartbetError`] with `SB_ERR_` prefix codes
//! - **Constants**: defaults and engine metadata

pub mod bet;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod fixture;
pub mod ids;
pub mod user;
pub mod withdrawal;

// Re-export all primary types at crate root for ergonomic imports:
//   use smartbet_types::{Bet, Match, Principal, SmartbetError, ...};

pub use bet::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use fixture::*;
pub use ids::*;
pub use user::*;
pub use withdrawal::*;

/// Monetary amount. All stakes, fees, and winnings use exact decimal math.
pub type Amount = rust_decimal::Decimal;

/// Wall-clock / ledger time.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// Constants are accessed via `smartbet_types::constants::FOO`
// (not re-exported to avoid name collisions).
