//! Bet intake.
//!
//! Placing a bet is two steps around the stake deposit:
//! [`Book::check_bet`] runs every precondition, the caller moves the stake
//! into custody, then [`Book::record_bet`] appends the bet. Both run under
//! the same lock hold, so nothing can change in between.
//!
//! Preconditions, in order:
//! 1. caller not banned
//! 2. caller registered
//! 3. match exists
//! 4. match not finished
//! 5. `now < scheduled_at`
//! 6. `amount == entry_fee`

use smartbet_types::{
    Amount, Bet, BetId, Event, MatchId, Principal, Result, Scoreline, SmartbetError, Timestamp,
};

use crate::book::Book;

/// A bet as submitted by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetSlip {
    pub user: Principal,
    pub match_id: MatchId,
    pub prediction: Scoreline,
    pub amount: Amount,
}

impl BetSlip {
    #[must_use]
    pub fn new(user: Principal, match_id: MatchId, prediction: Scoreline, amount: Amount) -> Self {
        Self {
            user,
            match_id,
            prediction,
            amount,
        }
    }
}

impl Book {
    /// Validate `slip` against the current state. Writes nothing.
    pub fn check_bet(&self, slip: &BetSlip, now: Timestamp) -> Result<()> {
        self.guard.require_not_banned(&self.store, &slip.user)?;
        self.guard.require_registered(&self.store, &slip.user)?;

        let record = self
            .store
            .match_record(slip.match_id)
            .ok_or(SmartbetError::MatchNotFound(slip.match_id))?;
        if record.finished {
            return Err(SmartbetError::MatchFinished(slip.match_id));
        }
        if !record.accepts_bets_at(now) {
            return Err(SmartbetError::BettingClosed {
                match_id: slip.match_id,
                scheduled_at: record.scheduled_at,
                now,
            });
        }

        let expected = self.config.entry_fee;
        if slip.amount != expected {
            return Err(SmartbetError::IncorrectAmount {
                expected,
                actual: slip.amount,
            });
        }
        Ok(())
    }

    /// Append a validated bet whose stake is already in custody.
    pub fn record_bet(&mut self, slip: &BetSlip, now: Timestamp) -> Result<BetId> {
        let bet = Bet {
            id: self.store.next_bet_id(),
            user: slip.user,
            match_id: slip.match_id,
            prediction: slip.prediction,
            amount: slip.amount,
            user_generation: self.store.user_or_default(&slip.user).generation,
            placed_at: now,
        };
        let id = self.store.append_bet(bet)?;
        self.custody.record_stake(slip.amount);
        self.events.emit(
            Event::BetPlaced {
                bet_id: id,
                user: slip.user,
                match_id: slip.match_id,
                predicted_score_team1: slip.prediction.team1,
                predicted_score_team2: slip.prediction.team2,
                amount: slip.amount,
            },
            now,
        );
        Ok(id)
    }
}
