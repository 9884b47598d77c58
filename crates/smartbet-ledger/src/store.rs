//! Ledger store: the only owner of entity state.
//!
//! Plain keyed reads and writes. No policy lives here: callers run the
//! [`AccessGuard`](crate::AccessGuard) and domain checks first, then write.
//! Matches and bets are append-only tables whose ids are their positions.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smartbet_types::{Amount, Bet, BetId, Match, MatchId, Principal, Result, SmartbetError, User};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStore {
    /// Users table. Slots are reset, never erased.
    users: HashMap<Principal, User>,
    /// Matches table, indexed by `MatchId.0`.
    matches: Vec<Match>,
    /// Bets table, indexed by `BetId.0`.
    bets: Vec<Bet>,
    /// Bet ids per match, in placement order.
    bets_by_match: HashMap<MatchId, Vec<BetId>>,
    /// Withdrawable winnings per principal. Zero entries are removed.
    winnings: HashMap<Principal, Amount>,
}

impl LedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn user(&self, principal: &Principal) -> Option<&User> {
        self.users.get(principal)
    }

    /// The slot for `principal`, or a default slot if it was never written.
    #[must_use]
    pub fn user_or_default(&self, principal: &Principal) -> User {
        self.users.get(principal).cloned().unwrap_or_default()
    }

    /// Mutable slot, created on first write.
    pub fn user_mut(&mut self, principal: Principal) -> &mut User {
        self.users.entry(principal).or_default()
    }

    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.users.values().filter(|u| u.registered()).count()
    }

    // ---------------------------------------------------------------------
    // Matches
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn next_match_id(&self) -> MatchId {
        MatchId(self.matches.len() as u64)
    }

    /// Append a match. Its id must be [`Self::next_match_id`].
    pub fn append_match(&mut self, record: Match) -> Result<MatchId> {
        let expected = self.next_match_id();
        if record.id != expected {
            return Err(SmartbetError::Internal(format!(
                "out-of-sequence match {}, expected {expected}",
                record.id
            )));
        }
        self.matches.push(record);
        Ok(expected)
    }

    #[must_use]
    pub fn match_record(&self, id: MatchId) -> Option<&Match> {
        usize::try_from(id.0).ok().and_then(|i| self.matches.get(i))
    }

    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        usize::try_from(id.0)
            .ok()
            .and_then(|i| self.matches.get_mut(i))
    }

    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    // ---------------------------------------------------------------------
    // Bets
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn next_bet_id(&self) -> BetId {
        BetId(self.bets.len() as u64)
    }

    /// Append a bet and index it under its match. Its id must be
    /// [`Self::next_bet_id`] and its match must exist.
    pub fn append_bet(&mut self, bet: Bet) -> Result<BetId> {
        let expected = self.next_bet_id();
        if bet.id != expected {
            return Err(SmartbetError::Internal(format!(
                "out-of-sequence bet {}, expected {expected}",
                bet.id
            )));
        }
        if self.match_record(bet.match_id).is_none() {
            return Err(SmartbetError::MatchNotFound(bet.match_id));
        }
        self.bets_by_match.entry(bet.match_id).or_default().push(bet.id);
        self.bets.push(bet);
        Ok(expected)
    }

    #[must_use]
    pub fn bet(&self, id: BetId) -> Option<&Bet> {
        usize::try_from(id.0).ok().and_then(|i| self.bets.get(i))
    }

    /// Bets on `match_id`, in placement order.
    pub fn bets_for_match(&self, match_id: MatchId) -> impl Iterator<Item = &Bet> + '_ {
        self.bets_by_match
            .get(&match_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.bet(*id))
    }

    #[must_use]
    pub fn bet_count(&self) -> usize {
        self.bets.len()
    }

    // ---------------------------------------------------------------------
    // Winnings
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn winnings(&self, principal: &Principal) -> Amount {
        self.winnings
            .get(principal)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Add to a winnings entry.
    pub fn credit_winnings(&mut self, principal: Principal, amount: Amount) {
        if amount.is_zero() {
            return;
        }
        *self.winnings.entry(principal).or_insert(Decimal::ZERO) += amount;
    }

    /// Read and zero a winnings entry in one step.
    pub fn take_winnings(&mut self, principal: &Principal) -> Amount {
        self.winnings.remove(principal).unwrap_or(Decimal::ZERO)
    }

    /// Sum of all withdrawable winnings.
    #[must_use]
    pub fn total_winnings(&self) -> Amount {
        self.winnings.values().copied().sum()
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
