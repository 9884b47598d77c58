//! Withdrawal desk: ticketed payouts of winnings.
//!
//! ```text
//! begin()     winnings[user] → 0, ticket PENDING, in_flight += amount
//!   transfer runs outside any lock
//! complete()  ticket COMPLETED, in_flight → paid_out
//! roll_back() ticket ROLLED_BACK, winnings[user] += amount, in_flight -= amount
//! ```
//!
//! The entry is zeroed in `begin`, before any funds move, so a second
//! withdrawal that arrives while the first transfer is outstanding sees
//! nothing to withdraw.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smartbet_ledger::LedgerStore;
use smartbet_types::{
    Principal, Result, SmartbetError, TicketId, Timestamp, WithdrawalTicket,
};

use crate::custody::CustodyAccounting;

/// Every withdrawal attempt, pending or resolved, keyed by ticket id.
///
/// Resolved tickets are the payout audit trail and stay until
/// [`prune_resolved`](Self::prune_resolved) drops them. Pending tickets are
/// never pruned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WithdrawalDesk {
    tickets: HashMap<TicketId, WithdrawalTicket>,
}

impl WithdrawalDesk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Debit the user's whole winnings entry and issue a pending ticket.
    ///
    /// # Errors
    /// [`SmartbetError::NoWinnings`] if the entry is zero; nothing changes.
    pub fn begin(
        &mut self,
        store: &mut LedgerStore,
        custody: &mut CustodyAccounting,
        user: Principal,
        now: Timestamp,
    ) -> Result<WithdrawalTicket> {
        let amount = store.take_winnings(&user);
        if amount.is_zero() {
            return Err(SmartbetError::NoWinnings(user));
        }
        custody.begin_payout(amount);

        let ticket = WithdrawalTicket::issue(user, amount, now);
        tracing::debug!(ticket = %ticket.id, user = %user, amount = %amount, "Withdrawal ticket issued");
        self.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    /// The transfer for `id` succeeded.
    ///
    /// # Errors
    /// [`SmartbetError::InvalidWithdrawal`] if the ticket is unknown or not pending.
    pub fn complete(
        &mut self,
        custody: &mut CustodyAccounting,
        id: TicketId,
    ) -> Result<WithdrawalTicket> {
        let ticket = self.pending_mut(id)?;
        ticket.mark_completed()?;
        custody.complete_payout(ticket.amount);
        Ok(ticket.clone())
    }

    /// The transfer for `id` failed: put the amount back on the user's entry.
    ///
    /// Adds rather than overwrites, so winnings credited while the transfer
    /// was outstanding are kept.
    ///
    /// # Errors
    /// [`SmartbetError::InvalidWithdrawal`] if the ticket is unknown or not pending.
    pub fn roll_back(
        &mut self,
        store: &mut LedgerStore,
        custody: &mut CustodyAccounting,
        id: TicketId,
    ) -> Result<WithdrawalTicket> {
        let ticket = self.pending_mut(id)?;
        ticket.mark_rolled_back()?;
        store.credit_winnings(ticket.user, ticket.amount);
        custody.cancel_payout(ticket.amount);
        tracing::warn!(ticket = %ticket.id, user = %ticket.user, amount = %ticket.amount, "Withdrawal rolled back");
        Ok(ticket.clone())
    }

    #[must_use]
    pub fn get(&self, id: &TicketId) -> Option<&WithdrawalTicket> {
        self.tickets.get(id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tickets.values().filter(|t| t.is_pending()).count()
    }

    /// All tickets of `user`, by issue time.
    #[must_use]
    pub fn tickets_for(&self, user: &Principal) -> Vec<&WithdrawalTicket> {
        let mut tickets: Vec<_> = self.tickets.values().filter(|t| t.user == *user).collect();
        tickets.sort_by_key(|t| (t.issued_at, t.id));
        tickets
    }

    /// Drop resolved tickets issued before `cutoff`. Returns how many went.
    pub fn prune_resolved(&mut self, cutoff: Timestamp) -> usize {
        let before = self.tickets.len();
        self.tickets.retain(|_, t| t.is_pending() || t.issued_at >= cutoff);
        let pruned = before - self.tickets.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.tickets.len(), "Resolved tickets pruned");
        }
        pruned
    }

    fn pending_mut(&mut self, id: TicketId) -> Result<&mut WithdrawalTicket> {
        self.tickets
            .get_mut(&id)
            .ok_or_else(|| SmartbetError::InvalidWithdrawal {
                reason: format!("unknown ticket {id}"),
            })
    }
}
