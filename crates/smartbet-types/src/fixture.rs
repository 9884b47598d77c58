//! Match records and the scheduled → finished lifecycle.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐  finish_match  ┌──────────┐
//!   │ SCHEDULED ├───────────────▶│ FINISHED │
//!   └───────────┘                └──────────┘
//! ```
//!
//! `FINISHED` is terminal. There is no cancellation path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MatchId, SmartbetError, Timestamp};

/// A final or predicted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Scoreline {
    pub team1: u32,
    pub team2: u32,
}

impl Scoreline {
    #[must_use]
    pub fn new(team1: u32, team2: u32) -> Self {
        Self { team1, team2 }
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.team1, self.team2)
    }
}

/// Lifecycle state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Accepting bets until `scheduled_at`.
    Scheduled,
    /// Scores recorded and bets settled. Terminal.
    Finished,
}

impl MatchStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Scheduled, Self::Finished))
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Finished => write!(f, "FINISHED"),
        }
    }
}

/// One row of the Matches table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub team1: String,
    pub team2: String,
    /// Kick-off. Bets are accepted strictly before this instant.
    pub scheduled_at: Timestamp,
    /// Zero until finished.
    pub score_team1: u32,
    pub score_team2: u32,
    pub finished: bool,
    pub finished_at: Option<Timestamp>,
}

impl Match {
    #[must_use]
    pub fn new(
        id: MatchId,
        team1: impl Into<String>,
        team2: impl Into<String>,
        scheduled_at: Timestamp,
    ) -> Self {
        Self {
            id,
            team1: team1.into(),
            team2: team2.into(),
            scheduled_at,
            score_team1: 0,
            score_team2: 0,
            finished: false,
            finished_at: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        if self.finished {
            MatchStatus::Finished
        } else {
            MatchStatus::Scheduled
        }
    }

    /// The recorded final score. Meaningful only once finished.
    #[must_use]
    pub fn final_score(&self) -> Scoreline {
        Scoreline::new(self.score_team1, self.score_team2)
    }

    /// Whether a bet submitted at `now` is still in time.
    #[must_use]
    pub fn accepts_bets_at(&self, now: Timestamp) -> bool {
        !self.finished && now < self.scheduled_at
    }

    /// Record the final score and move to FINISHED.
    ///
    /// # Errors
    /// Returns [`SmartbetError::AlreadyFinished`] if the match is already finished.
    pub fn finish(&mut self, score: Scoreline, at: Timestamp) -> crate::Result<()> {
        if !self.status().can_transition_to(MatchStatus::Finished) {
            return Err(SmartbetError::AlreadyFinished(self.id));
        }
        self.score_team1 = score.team1;
        self.score_team2 = score.team2;
        self.finished = true;
        self.finished_at = Some(at);
        Ok(())
    }
}

/// Dummy match for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Match {
    /// A scheduled match kicking off one day from now.
    pub fn dummy(id: MatchId) -> Self {
        Self::new(
            id,
            "Team1",
            "Team2",
            chrono::Utc::now() + chrono::Duration::days(1),
        )
    }
}
