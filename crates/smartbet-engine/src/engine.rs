//! The async engine facade.
//!
//! [`SmartBet`] serializes every operation through one `tokio` mutex around
//! the [`Book`]. The lock is held for the whole operation, including the
//! stake deposit in `place_bet`. The one exception is the payout transfer
//! in `withdraw_winnings`: the winnings entry is zeroed and a ticket issued
//! under the lock, the lock is released, and only then is the transfer
//! attempted. A call that arrives during the transfer sees zero winnings.
//!
//! The ticket is resolved even if the caller drops the future mid-payout:
//! a payout whose transfer never returned is rolled back, one whose
//! transfer returned `Ok` is completed.

use std::sync::Arc;

use rust_decimal::Decimal;
use smartbet_ledger::{Clock, FundsTransfer, InMemoryWallet, SystemClock};
use smartbet_settlement::{CustodyAccounting, SettlementReport};
use smartbet_types::{
    Amount, Bet, BetId, EngineConfig, EventRecord, Match, MatchId, Principal, Result, Scoreline,
    TicketId, Timestamp, User, WithdrawalTicket, constants,
};
use tokio::sync::Mutex;

use crate::betting::BetSlip;
use crate::book::Book;

pub struct SmartBet<T, C = SystemClock> {
    config: EngineConfig,
    book: Arc<Mutex<Book>>,
    transfer: T,
    clock: C,
}

impl SmartBet<InMemoryWallet, SystemClock> {
    /// Engine over an empty in-memory wallet and the wall clock.
    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        Self::new(config, InMemoryWallet::new(), SystemClock)
    }
}

impl<T: FundsTransfer, C: Clock> SmartBet<T, C> {
    pub fn new(config: EngineConfig, transfer: T, clock: C) -> Result<Self> {
        let book = Book::new(config.clone())?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            owner = %config.owner,
            entry_fee = %config.entry_fee,
            payout_policy = ?config.payout_policy,
            "Engine initialized"
        );
        Ok(Self {
            config,
            book: Arc::new(Mutex::new(book)),
            transfer,
            clock,
        })
    }

    #[must_use]
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    pub async fn register_user(&self, caller: Principal) -> Result<()> {
        let now = self.clock.now();
        self.book.lock().await.register_user(caller, now)
    }

    pub async fn add_match(
        &self,
        caller: Principal,
        team1: impl Into<String>,
        team2: impl Into<String>,
        scheduled_at: Timestamp,
    ) -> Result<MatchId> {
        let now = self.clock.now();
        self.book
            .lock()
            .await
            .add_match(caller, team1, team2, scheduled_at, now)
    }

    /// Validate, pull the stake into custody, then record the bet.
    ///
    /// # Errors
    /// Any precondition failure from [`Book::check_bet`], or `TransferFailed`
    /// if the stake could not be deposited. Nothing is recorded on error.
    pub async fn place_bet(
        &self,
        caller: Principal,
        match_id: MatchId,
        predicted_team1: u32,
        predicted_team2: u32,
        amount: Amount,
    ) -> Result<BetId> {
        let now = self.clock.now();
        let slip = BetSlip::new(
            caller,
            match_id,
            Scoreline::new(predicted_team1, predicted_team2),
            amount,
        );

        let mut book = self.book.lock().await;
        book.check_bet(&slip, now)?;
        if let Err(e) = self.transfer.deposit(caller, amount).await {
            tracing::warn!(
                user = %caller,
                match_id = %match_id,
                error = %e,
                "Stake deposit failed, bet not recorded"
            );
            return Err(e);
        }
        book.record_bet(&slip, now)
    }

    pub async fn finish_match(
        &self,
        caller: Principal,
        match_id: MatchId,
        score_team1: u32,
        score_team2: u32,
    ) -> Result<SettlementReport> {
        let now = self.clock.now();
        self.book.lock().await.finish_match(
            caller,
            match_id,
            Scoreline::new(score_team1, score_team2),
            now,
        )
    }

    /// Pay the caller's whole winnings entry out of custody.
    ///
    /// Returns the amount sent. On transfer failure the entry is restored
    /// and the transfer error is returned.
    pub async fn withdraw_winnings(&self, caller: Principal) -> Result<Amount> {
        let now = self.clock.now();
        let ticket = self.book.lock().await.begin_withdrawal(caller, now)?;
        let payout = PendingPayout::new(Arc::clone(&self.book), ticket.id, now);

        let outcome = self.transfer.withdraw(caller, ticket.amount).await;
        if let Err(e) = &outcome {
            tracing::warn!(
                user = %caller,
                amount = %ticket.amount,
                error = %e,
                "Payout transfer failed"
            );
        }
        payout.resolve(outcome).await
    }

    pub async fn update_user_balance(
        &self,
        caller: Principal,
        user: Principal,
        amount: Amount,
    ) -> Result<()> {
        let now = self.clock.now();
        self.book
            .lock()
            .await
            .update_user_balance(caller, user, amount, now)
    }

    pub async fn ban_user(&self, caller: Principal, user: Principal) -> Result<()> {
        let now = self.clock.now();
        self.book.lock().await.ban_user(caller, user, now)
    }

    pub async fn remove_user(&self, caller: Principal, user: Principal) -> Result<()> {
        let now = self.clock.now();
        self.book.lock().await.remove_user(caller, user, now)
    }

    /// Owner-only. Forget resolved withdrawal tickets issued before `cutoff`.
    pub async fn prune_tickets(&self, caller: Principal, cutoff: Timestamp) -> Result<usize> {
        self.book.lock().await.prune_tickets(caller, cutoff)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn owner(&self) -> Principal {
        self.config.owner
    }

    #[must_use]
    pub fn entry_fee(&self) -> Amount {
        self.config.entry_fee
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The user's slot; a default slot if never written.
    pub async fn user(&self, principal: Principal) -> User {
        self.book.lock().await.store().user_or_default(&principal)
    }

    pub async fn match_record(&self, id: MatchId) -> Option<Match> {
        self.book.lock().await.store().match_record(id).cloned()
    }

    pub async fn bet(&self, id: BetId) -> Option<Bet> {
        self.book.lock().await.store().bet(id).cloned()
    }

    pub async fn bets_for_match(&self, id: MatchId) -> Vec<Bet> {
        self.book
            .lock()
            .await
            .store()
            .bets_for_match(id)
            .cloned()
            .collect()
    }

    pub async fn winnings(&self, principal: Principal) -> Amount {
        self.book.lock().await.store().winnings(&principal)
    }

    pub async fn match_count(&self) -> usize {
        self.book.lock().await.store().match_count()
    }

    pub async fn bet_count(&self) -> usize {
        self.book.lock().await.store().bet_count()
    }

    pub async fn events(&self) -> Vec<EventRecord> {
        self.book.lock().await.events().to_vec()
    }

    pub async fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.book.lock().await.event_log().since(from).to_vec()
    }

    pub async fn custody(&self) -> CustodyAccounting {
        self.book.lock().await.custody().clone()
    }

    pub async fn ticket(&self, id: TicketId) -> Option<WithdrawalTicket> {
        self.book.lock().await.desk().get(&id).cloned()
    }

    pub async fn tickets_for(&self, user: Principal) -> Vec<WithdrawalTicket> {
        self.book
            .lock()
            .await
            .desk()
            .tickets_for(&user)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Σ of all withdrawable winnings.
    pub async fn total_winnings(&self) -> Amount {
        self.book.lock().await.store().total_winnings()
    }

    /// JSON snapshot of the four tables and the per-match index.
    pub async fn snapshot_json(&self) -> Result<String> {
        self.book.lock().await.store().to_json()
    }

    /// Check the solvency invariant and, once every payout has resolved,
    /// that the substrate holds exactly what the books say.
    pub async fn verify_custody(&self) -> Result<()> {
        let book = self.book.lock().await;
        book.check_solvency()?;
        let custody = book.custody();
        if custody.is_quiescent() {
            let actual = self.transfer.custody_balance().await;
            custody.verify_against(actual)?;
        }
        Ok(())
    }

    /// Funds held in custody that no winnings entry or pending payout claims.
    pub async fn unclaimed_custody(&self) -> Amount {
        let book = self.book.lock().await;
        let custody = book.custody();
        (custody.expected_custody() - custody.in_flight() - book.store().total_winnings())
            .max(Decimal::ZERO)
    }
}

/// A withdrawal ticket that has been issued but not yet resolved.
///
/// Dropping it unresolved settles the ticket from `Drop`: completed if the
/// transfer already returned `Ok`, rolled back otherwise.
struct PendingPayout {
    book: Arc<Mutex<Book>>,
    ticket: TicketId,
    now: Timestamp,
    transferred: bool,
    resolved: bool,
}

impl PendingPayout {
    fn new(book: Arc<Mutex<Book>>, ticket: TicketId, now: Timestamp) -> Self {
        Self {
            book,
            ticket,
            now,
            transferred: false,
            resolved: false,
        }
    }

    async fn resolve(mut self, outcome: Result<()>) -> Result<Amount> {
        self.transferred = outcome.is_ok();
        let mut book = self.book.lock().await;
        self.resolved = true;
        match outcome {
            Ok(()) => book.complete_withdrawal(self.ticket, self.now),
            Err(e) => {
                book.roll_back_withdrawal(self.ticket)?;
                Err(e)
            }
        }
    }
}

fn settle_abandoned(book: &mut Book, ticket: TicketId, now: Timestamp, transferred: bool) {
    let result = if transferred {
        book.complete_withdrawal(ticket, now).map(|_| ())
    } else {
        book.roll_back_withdrawal(ticket).map(|_| ())
    };
    if let Err(e) = result {
        tracing::error!(ticket = %ticket, error = %e, "Abandoned withdrawal could not be resolved");
    }
}

impl Drop for PendingPayout {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let (ticket, now, transferred) = (self.ticket, self.now, self.transferred);
        tracing::warn!(ticket = %ticket, transferred, "Withdrawal abandoned before resolution");

        if let Ok(mut book) = self.book.try_lock() {
            settle_abandoned(&mut book, ticket, now, transferred);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let book = Arc::clone(&self.book);
                handle.spawn(async move {
                    settle_abandoned(&mut *book.lock().await, ticket, now, transferred);
                });
            }
            Err(_) => {
                tracing::error!(ticket = %ticket, "No runtime to resolve abandoned withdrawal");
            }
        }
    }
}

impl<T, C> std::fmt::Debug for SmartBet<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartBet")
            .field("owner", &self.config.owner)
            .field("entry_fee", &self.config.entry_fee)
            .field("payout_policy", &self.config.payout_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use smartbet_types::TicketState;

    fn shared_book(user: Principal) -> (Arc<Mutex<Book>>, WithdrawalTicket) {
        let mut book = Book::new(EngineConfig::new(Principal::from_label("owner"))).unwrap();
        book.custody.record_stake(Decimal::new(1, 2));
        book.store.credit_winnings(user, Decimal::new(1, 2));
        let ticket = book.begin_withdrawal(user, Utc::now()).unwrap();
        (Arc::new(Mutex::new(book)), ticket)
    }

    #[tokio::test]
    async fn dropped_before_transfer_rolls_back() {
        let alice = Principal::from_label("alice");
        let (book, ticket) = shared_book(alice);

        drop(PendingPayout::new(Arc::clone(&book), ticket.id, Utc::now()));

        let book = book.lock().await;
        assert_eq!(book.desk().get(&ticket.id).unwrap().state, TicketState::RolledBack);
        assert_eq!(book.store().winnings(&alice), Decimal::new(1, 2));
        assert!(book.custody().is_quiescent());
    }

    #[tokio::test]
    async fn dropped_after_transfer_completes() {
        let alice = Principal::from_label("alice");
        let (book, ticket) = shared_book(alice);

        let mut payout = PendingPayout::new(Arc::clone(&book), ticket.id, Utc::now());
        payout.transferred = true;
        drop(payout);

        let book = book.lock().await;
        assert_eq!(book.desk().get(&ticket.id).unwrap().state, TicketState::Completed);
        assert_eq!(book.store().winnings(&alice), Decimal::ZERO);
        assert_eq!(book.custody().paid_out(), Decimal::new(1, 2));
        assert_eq!(book.events().len(), 1);
    }

    #[tokio::test]
    async fn dropped_under_contention_resolves_later() {
        let alice = Principal::from_label("alice");
        let (book, ticket) = shared_book(alice);

        let held = book.lock().await;
        drop(PendingPayout::new(Arc::clone(&book), ticket.id, Utc::now()));
        assert!(held.desk().get(&ticket.id).unwrap().is_pending());
        drop(held);

        for _ in 0..100 {
            if !book.lock().await.desk().get(&ticket.id).unwrap().is_pending() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let book = book.lock().await;
        assert_eq!(book.desk().get(&ticket.id).unwrap().state, TicketState::RolledBack);
        assert_eq!(book.store().winnings(&alice), Decimal::new(1, 2));
    }
}
