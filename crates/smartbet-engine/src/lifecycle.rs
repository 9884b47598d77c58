//! Match lifecycle: `Scheduled → Finished`.
//!
//! Finishing a match settles it in the same step. If settlement fails the
//! match is put back exactly as it was, so the call has no effect.

use smartbet_settlement::SettlementReport;
use smartbet_types::{
    Event, Match, MatchId, Principal, Result, Scoreline, SmartbetError, Timestamp,
};

use crate::book::Book;

impl Book {
    /// Owner-only. Schedules a match at the next id.
    pub fn add_match(
        &mut self,
        caller: Principal,
        team1: impl Into<String>,
        team2: impl Into<String>,
        scheduled_at: Timestamp,
        now: Timestamp,
    ) -> Result<MatchId> {
        self.guard.require_owner(&caller)?;

        let record = Match::new(self.store.next_match_id(), team1, team2, scheduled_at);
        let event = Event::MatchAdded {
            id: record.id,
            team1: record.team1.clone(),
            team2: record.team2.clone(),
            scheduled_at,
        };
        let id = self.store.append_match(record)?;
        self.events.emit(event, now);
        Ok(id)
    }

    /// Owner-only. Records the final score and settles every bet on the match.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `MatchNotFound` / `AlreadyFinished`
    /// - `SolvencyViolation` if the credits would exceed custody
    pub fn finish_match(
        &mut self,
        caller: Principal,
        match_id: MatchId,
        score: Scoreline,
        now: Timestamp,
    ) -> Result<SettlementReport> {
        self.guard.require_owner(&caller)?;

        let record = self
            .store
            .match_mut(match_id)
            .ok_or(SmartbetError::MatchNotFound(match_id))?;
        let before = record.clone();
        record.finish(score, now)?;

        let report = match self
            .settlement
            .settle(&mut self.store, &mut self.custody, match_id)
        {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(match_id = %match_id, error = %e, "Settlement failed, match left unfinished");
                if let Some(record) = self.store.match_mut(match_id) {
                    *record = before;
                }
                return Err(e);
            }
        };

        self.events.emit(
            Event::MatchFinished {
                id: match_id,
                score_team1: score.team1,
                score_team2: score.team2,
            },
            now,
        );
        for credit in &report.credits {
            self.events.emit(
                Event::WinningsCredited {
                    user: credit.user,
                    match_id,
                    amount: credit.amount,
                },
                now,
            );
        }
        Ok(report)
    }
}
