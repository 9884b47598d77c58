//! # WithdrawalTicket: a debit committed ahead of its transfer
//!
//! A withdrawal zeroes the user's winnings entry *before* any funds move.
//! The ticket carries the debited amount across the transfer so the
//! debit can be either finalized or rolled back.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  transfer ok    ┌───────────┐
//!   │ PENDING ├────────────────▶│ COMPLETED │
//!   └────┬────┘                 └───────────┘
//!        │ transfer failed
//!        ▼
//!   ┌─────────────┐
//!   │ ROLLED_BACK │
//!   └─────────────┘
//! ```
//!
//! Transitions are monotonic. A ticket settles exactly once, so a rollback
//! can never re-credit an amount that was also paid out.

use serde::{Deserialize, Serialize};

use crate::{Amount, Principal, SmartbetError, TicketId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketState {
    /// Ledger debited, transfer not yet resolved.
    Pending,
    /// Funds delivered. **Irreversible.**
    Completed,
    /// Transfer failed; the debited amount went back to the ledger.
    RolledBack,
}

impl TicketState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Completed | Self::RolledBack)
        )
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::RolledBack => write!(f, "ROLLED_BACK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalTicket {
    pub id: TicketId,
    pub user: Principal,
    /// The winnings entry as it was when zeroed.
    pub amount: Amount,
    pub state: TicketState,
    pub issued_at: Timestamp,
}

impl WithdrawalTicket {
    #[must_use]
    pub fn issue(user: Principal, amount: Amount, issued_at: Timestamp) -> Self {
        Self {
            id: TicketId::new(),
            user,
            amount,
            state: TicketState::Pending,
            issued_at,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == TicketState::Pending
    }

    /// # Errors
    /// Returns [`SmartbetError::InvalidWithdrawal`] unless the ticket is pending.
    pub fn mark_completed(&mut self) -> crate::Result<()> {
        self.transition(TicketState::Completed)
    }

    /// # Errors
    /// Returns [`SmartbetError::InvalidWithdrawal`] unless the ticket is pending.
    pub fn mark_rolled_back(&mut self) -> crate::Result<()> {
        self.transition(TicketState::RolledBack)
    }

    fn transition(&mut self, target: TicketState) -> crate::Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(SmartbetError::InvalidWithdrawal {
                reason: format!(
                    "Cannot transition ticket {} from {} to {target}",
                    self.id, self.state
                ),
            });
        }
        self.state = target;
        Ok(())
    }
}
