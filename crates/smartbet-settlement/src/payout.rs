//! Exact-score settlement of a finished match.
//!
//! Settlement is split into a read-only **plan** and a write **apply** so the
//! solvency invariant can be checked on projected totals before a single
//! winnings entry changes. Either every credit lands or none does.
//!
//! A bet is a winner iff its predicted scoreline equals the final score.
//! A winner is *eligible* only if its bettor's slot is still registered
//! under the generation the bet was placed with; bets of removed users are
//! forfeited to the house.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use smartbet_ledger::LedgerStore;
use smartbet_types::{
    Amount, BetId, EngineConfig, MatchId, PayoutPolicy, Principal, Result, Scoreline,
    SmartbetError,
};

use crate::custody::CustodyAccounting;

/// One winnings credit produced by settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub bet_id: BetId,
    pub user: Principal,
    pub amount: Amount,
}

/// Everything settlement will write, computed without writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub match_id: MatchId,
    pub result: Scoreline,
    pub bets_considered: usize,
    /// Σ stakes on the match.
    pub pot: Amount,
    pub credits: Vec<Credit>,
    /// Exact-score bets whose bettor was removed since placing them.
    pub forfeited: Vec<BetId>,
}

impl SettlementPlan {
    #[must_use]
    pub fn total_credited(&self) -> Amount {
        self.credits.iter().map(|c| c.amount).sum()
    }

    #[must_use]
    pub fn house_retained(&self) -> Amount {
        self.pot - self.total_credited()
    }
}

/// Outcome of settling one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub match_id: MatchId,
    pub result: Scoreline,
    pub bets_considered: usize,
    pub winners: usize,
    pub credited: Amount,
    pub house_retained: Amount,
    pub credits: Vec<Credit>,
}

/// Computes and applies winnings for finished matches.
#[derive(Debug, Clone, Copy)]
pub struct SettlementEngine {
    policy: PayoutPolicy,
    amount_scale: u32,
}

impl SettlementEngine {
    #[must_use]
    pub fn new(policy: PayoutPolicy, amount_scale: u32) -> Self {
        Self {
            policy,
            amount_scale,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.payout_policy, config.amount_scale)
    }

    #[must_use]
    pub fn policy(&self) -> PayoutPolicy {
        self.policy
    }

    /// Work out the credits for a finished match. Reads only.
    ///
    /// # Errors
    /// - `MatchNotFound` if the match does not exist
    /// - `Internal` if the match is not finished yet
    pub fn plan(&self, store: &LedgerStore, match_id: MatchId) -> Result<SettlementPlan> {
        let record = store
            .match_record(match_id)
            .ok_or(SmartbetError::MatchNotFound(match_id))?;
        if !record.finished {
            return Err(SmartbetError::Internal(format!(
                "cannot settle {match_id}: match is not finished"
            )));
        }
        let result = record.final_score();

        let mut bets_considered = 0;
        let mut pot = Decimal::ZERO;
        let mut winners = Vec::new();
        let mut forfeited = Vec::new();

        for bet in store.bets_for_match(match_id) {
            bets_considered += 1;
            pot += bet.amount;
            if !bet.wins_against(result) {
                continue;
            }
            let slot = store.user_or_default(&bet.user);
            if slot.registered() && slot.generation == bet.user_generation {
                winners.push(bet);
            } else {
                tracing::debug!(
                    bet = %bet.id,
                    user = %bet.user,
                    "Winning bet forfeited: bettor removed since placing it"
                );
                forfeited.push(bet.id);
            }
        }

        let credits = match self.policy {
            PayoutPolicy::RefundStake => winners
                .iter()
                .map(|bet| Credit {
                    bet_id: bet.id,
                    user: bet.user,
                    amount: bet.amount,
                })
                .collect(),
            PayoutPolicy::SplitPot => {
                let winning_stake: Amount = winners.iter().map(|b| b.amount).sum();
                let mut credits = Vec::with_capacity(winners.len());
                for bet in &winners {
                    let share = pot
                        .checked_mul(bet.amount)
                        .and_then(|v| v.checked_div(winning_stake))
                        .ok_or_else(|| {
                            SmartbetError::Internal(format!(
                                "pot share overflow for {} (pot={pot}, stake={})",
                                bet.id, bet.amount
                            ))
                        })?
                        .round_dp_with_strategy(self.amount_scale, RoundingStrategy::ToZero);
                    credits.push(Credit {
                        bet_id: bet.id,
                        user: bet.user,
                        amount: share,
                    });
                }
                credits
            }
        };

        Ok(SettlementPlan {
            match_id,
            result,
            bets_considered,
            pot,
            credits,
            forfeited,
        })
    }

    /// Credit every planned winner. Infallible: all checks happen in
    /// [`Self::plan`] and [`Self::settle`].
    pub fn apply(
        &self,
        store: &mut LedgerStore,
        custody: &mut CustodyAccounting,
        plan: &SettlementPlan,
    ) -> SettlementReport {
        for credit in &plan.credits {
            store.credit_winnings(credit.user, credit.amount);
            tracing::debug!(
                match_id = %plan.match_id,
                bet = %credit.bet_id,
                user = %credit.user,
                amount = %credit.amount,
                "Winnings credited"
            );
        }
        let house_retained = plan.house_retained();
        custody.record_house_retained(house_retained);

        SettlementReport {
            match_id: plan.match_id,
            result: plan.result,
            bets_considered: plan.bets_considered,
            winners: plan.credits.len(),
            credited: plan.total_credited(),
            house_retained,
            credits: plan.credits.clone(),
        }
    }

    /// Plan, check solvency on the projected totals, then apply.
    ///
    /// # Errors
    /// - anything [`Self::plan`] returns
    /// - `SolvencyViolation` if the credits would exceed custody; nothing is written
    pub fn settle(
        &self,
        store: &mut LedgerStore,
        custody: &mut CustodyAccounting,
        match_id: MatchId,
    ) -> Result<SettlementReport> {
        let plan = self.plan(store, match_id)?;
        custody.verify_solvency(store.total_winnings() + plan.total_credited())?;
        let report = self.apply(store, custody, &plan);

        tracing::info!(
            match_id = %report.match_id,
            result = %report.result,
            bets = report.bets_considered,
            winners = report.winners,
            credited = %report.credited,
            house_retained = %report.house_retained,
            policy = ?self.policy,
            "Match settled"
        );
        Ok(report)
    }
}
