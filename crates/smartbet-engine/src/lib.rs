//! # smartbet-engine
//!
//! The **SmartBet** wagering engine: users bet a fixed entry fee on the
//! exact final score of scheduled matches; when the owner finishes a match,
//! exact-score winners are credited and can withdraw from custody.
//!
//! ## Architecture
//!
//! ```text
//!            SmartBet<T: FundsTransfer, C: Clock>
//!                 │  tokio::Mutex<Book>
//!                 ▼
//! ┌──────────┬───────────┬──────────┬─────────────┐
//! │ registry │ lifecycle │ betting  │ withdrawals │   Book (sync, all-or-nothing)
//! └──────────┴───────────┴──────────┴─────────────┘
//!      │           │           │            │
//!  AccessGuard  SettlementEngine  LedgerStore  WithdrawalDesk
//!                     └──── CustodyAccounting ────┘
//! ```
//!
//! Every successful operation appends to the event log; see
//! [`Event`](smartbet_types::Event).
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> smartbet_types::Result<()> {
//! use chrono::{Duration, Utc};
//! use smartbet_engine::SmartBet;
//! use smartbet_types::{EngineConfig, Principal};
//!
//! let owner = Principal::from_label("owner");
//! let alice = Principal::from_label("alice");
//! let engine = SmartBet::in_memory(EngineConfig::new(owner))?;
//!
//! engine.transfer().fund(alice, engine.entry_fee()).await;
//! engine.register_user(alice).await?;
//! let m = engine.add_match(owner, "Team1", "Team2", Utc::now() + Duration::days(1)).await?;
//! engine.place_bet(alice, m, 2, 1, engine.entry_fee()).await?;
//! engine.finish_match(owner, m, 2, 1).await?;
//! let paid = engine.withdraw_winnings(alice).await?;
//! # let _ = paid;
//! # Ok(())
//! # }
//! ```

pub mod betting;
pub mod book;
pub mod engine;
pub mod events;
pub mod lifecycle;
pub mod registry;

pub use betting::BetSlip;
pub use book::Book;
pub use engine::SmartBet;
pub use events::EventLog;
