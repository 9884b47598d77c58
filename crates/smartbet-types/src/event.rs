//! Notifications emitted on successful operations.
//!
//! External observers (UIs, indexers) consume these. Every committed
//! operation appends its events in order; rejected operations append none.

use serde::{Deserialize, Serialize};

use crate::{Amount, BetId, MatchId, Principal, Timestamp};

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    UserRegistered {
        user: Principal,
    },
    MatchAdded {
        id: MatchId,
        team1: String,
        team2: String,
        scheduled_at: Timestamp,
    },
    MatchFinished {
        id: MatchId,
        score_team1: u32,
        score_team2: u32,
    },
    BetPlaced {
        bet_id: BetId,
        user: Principal,
        match_id: MatchId,
        predicted_score_team1: u32,
        predicted_score_team2: u32,
        amount: Amount,
    },
    WinningsCredited {
        user: Principal,
        match_id: MatchId,
        amount: Amount,
    },
    WinningsWithdrawn {
        user: Principal,
        amount: Amount,
    },
    UserBanned {
        user: Principal,
    },
    UserBalanceUpdated {
        user: Principal,
        amount: Amount,
    },
    UserRemoved {
        user: Principal,
    },
}

impl Event {
    /// Event name as observers see it.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "UserRegistered",
            Self::MatchAdded { .. } => "MatchAdded",
            Self::MatchFinished { .. } => "MatchFinished",
            Self::BetPlaced { .. } => "BetPlaced",
            Self::WinningsCredited { .. } => "WinningsCredited",
            Self::WinningsWithdrawn { .. } => "WinningsWithdrawn",
            Self::UserBanned { .. } => "UserBanned",
            Self::UserBalanceUpdated { .. } => "UserBalanceUpdated",
            Self::UserRemoved { .. } => "UserRemoved",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An event stamped with its position in the log and commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub at: Timestamp,
    pub event: Event,
}
