//! The synchronous core of the engine.
//!
//! A [`Book`] owns every piece of mutable state: the ledger store, custody
//! accounting, the withdrawal desk, and the event log. Its operations are
//! plain `&mut self` methods that either commit completely or return an
//! error without writing. [`SmartBet`](crate::SmartBet) wraps it in a lock
//! and adds the external transfer and clock.
//!
//! Operations are grouped by concern:
//! - [`registry`](crate::registry): user administration
//! - [`lifecycle`](crate::lifecycle): match creation and finishing
//! - [`betting`](crate::betting): bet intake
//! - withdrawals: below

use smartbet_ledger::{AccessGuard, LedgerStore};
use smartbet_settlement::{CustodyAccounting, SettlementEngine, WithdrawalDesk};
use smartbet_types::{
    Amount, EngineConfig, Event, EventRecord, Principal, Result, TicketId, Timestamp,
    WithdrawalTicket,
};

use crate::events::EventLog;

#[derive(Debug, Clone)]
pub struct Book {
    pub(crate) config: EngineConfig,
    pub(crate) guard: AccessGuard,
    pub(crate) store: LedgerStore,
    pub(crate) custody: CustodyAccounting,
    pub(crate) desk: WithdrawalDesk,
    pub(crate) settlement: SettlementEngine,
    pub(crate) events: EventLog,
}

impl Book {
    /// An empty book. Fails if the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            guard: AccessGuard::new(config.owner),
            settlement: SettlementEngine::from_config(&config),
            store: LedgerStore::new(),
            custody: CustodyAccounting::new(),
            desk: WithdrawalDesk::new(),
            events: EventLog::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    #[must_use]
    pub fn custody(&self) -> &CustodyAccounting {
        &self.custody
    }

    #[must_use]
    pub fn desk(&self) -> &WithdrawalDesk {
        &self.desk
    }

    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    #[must_use]
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Σ winnings + in-flight payouts ≤ custody.
    pub fn check_solvency(&self) -> Result<()> {
        self.custody.verify_solvency(self.store.total_winnings())
    }

    // ---------------------------------------------------------------------
    // Withdrawals
    // ---------------------------------------------------------------------

    /// First half of a withdrawal: zero the caller's entry and issue a ticket.
    ///
    /// # Errors
    /// - `UserBanned` if the caller is banned
    /// - `NoWinnings` if the caller has nothing to withdraw
    pub fn begin_withdrawal(
        &mut self,
        caller: Principal,
        now: Timestamp,
    ) -> Result<WithdrawalTicket> {
        self.guard.require_not_banned(&self.store, &caller)?;
        self.desk.begin(&mut self.store, &mut self.custody, caller, now)
    }

    /// The transfer for `ticket` went through.
    pub fn complete_withdrawal(&mut self, ticket: TicketId, now: Timestamp) -> Result<Amount> {
        let ticket = self.desk.complete(&mut self.custody, ticket)?;
        self.events.emit(
            Event::WinningsWithdrawn {
                user: ticket.user,
                amount: ticket.amount,
            },
            now,
        );
        Ok(ticket.amount)
    }

    /// The transfer for `ticket` failed: restore the winnings entry.
    pub fn roll_back_withdrawal(&mut self, ticket: TicketId) -> Result<WithdrawalTicket> {
        self.desk.roll_back(&mut self.store, &mut self.custody, ticket)
    }

    /// Owner-only. Forget resolved withdrawal tickets issued before `cutoff`.
    ///
    /// # Errors
    /// `Unauthorized` unless the caller is the owner.
    pub fn prune_tickets(&mut self, caller: Principal, cutoff: Timestamp) -> Result<usize> {
        self.guard.require_owner(&caller)?;
        Ok(self.desk.prune_resolved(cutoff))
    }
}
