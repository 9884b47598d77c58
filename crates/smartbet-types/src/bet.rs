//! Bet records.
//!
//! A [`Bet`] is immutable once appended. Settlement reads it exactly once,
//! when its match finishes.

use serde::{Deserialize, Serialize};

use crate::{Amount, BetId, MatchId, Principal, Scoreline, Timestamp};

/// One row of the append-only Bets table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub user: Principal,
    pub match_id: MatchId,
    /// Exact predicted final score.
    pub prediction: Scoreline,
    /// Stake moved into custody. Always equal to the entry fee at placement.
    pub amount: Amount,
    /// The bettor's slot generation at placement.
    pub user_generation: u64,
    pub placed_at: Timestamp,
}

impl Bet {
    /// Exact-score rule: both team scores must match.
    #[must_use]
    pub fn wins_against(&self, result: Scoreline) -> bool {
        self.prediction == result
    }
}

/// Dummy bet for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Bet {
    pub fn dummy(id: BetId, user: Principal, match_id: MatchId, prediction: Scoreline) -> Self {
        Self {
            id,
            user,
            match_id,
            prediction,
            amount: crate::constants::DEFAULT_ENTRY_FEE,
            user_generation: 0,
            placed_at: chrono::Utc::now(),
        }
    }
}
