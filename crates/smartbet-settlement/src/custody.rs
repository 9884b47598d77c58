//! Custody accounting and the solvency invariant.
//!
//! ```text
//! custody            = Σ stakes received − Σ paid out
//! owed               = Σ winnings entries + Σ pending payouts
//! invariant:  owed  ≤ custody
//! ```
//!
//! Settlement checks the invariant on its projected totals before writing;
//! the engine re-checks after every withdrawal step. A violation means
//! money was credited that the system does not hold.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smartbet_types::{Amount, Result, SmartbetError};

/// Running totals of funds entering and leaving custody.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyAccounting {
    stakes_received: Amount,
    paid_out: Amount,
    /// Debited from the winnings ledger, transfer not yet resolved.
    in_flight: Amount,
    /// Stakes no winner was credited with.
    house_retained: Amount,
}

impl CustodyAccounting {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stake(&mut self, amount: Amount) {
        self.stakes_received += amount;
    }

    pub fn record_house_retained(&mut self, amount: Amount) {
        self.house_retained += amount;
    }

    /// A withdrawal ticket was issued for `amount`.
    pub fn begin_payout(&mut self, amount: Amount) {
        self.in_flight += amount;
    }

    /// The transfer for a ticket succeeded.
    pub fn complete_payout(&mut self, amount: Amount) {
        self.in_flight -= amount;
        self.paid_out += amount;
    }

    /// The transfer for a ticket failed and the amount went back to the ledger.
    pub fn cancel_payout(&mut self, amount: Amount) {
        self.in_flight -= amount;
    }

    /// Funds that should be sitting in custody right now.
    #[must_use]
    pub fn expected_custody(&self) -> Amount {
        self.stakes_received - self.paid_out
    }

    #[must_use]
    pub fn stakes_received(&self) -> Amount {
        self.stakes_received
    }

    #[must_use]
    pub fn paid_out(&self) -> Amount {
        self.paid_out
    }

    #[must_use]
    pub fn in_flight(&self) -> Amount {
        self.in_flight
    }

    #[must_use]
    pub fn house_retained(&self) -> Amount {
        self.house_retained
    }

    /// Whether every payout has resolved.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.in_flight == Decimal::ZERO
    }

    /// Check `outstanding_winnings + in_flight ≤ custody`.
    ///
    /// # Errors
    /// Returns [`SmartbetError::SolvencyViolation`] if more is owed than held.
    pub fn verify_solvency(&self, outstanding_winnings: Amount) -> Result<()> {
        let owed = outstanding_winnings + self.in_flight;
        let held = self.expected_custody();
        if owed > held {
            return Err(SmartbetError::SolvencyViolation {
                reason: format!(
                    "owed {owed} (winnings={outstanding_winnings}, in_flight={}) exceeds custody {held} \
                     (stakes={}, paid_out={})",
                    self.in_flight, self.stakes_received, self.paid_out,
                ),
            });
        }
        Ok(())
    }

    /// Check the substrate's custody balance against the books.
    ///
    /// # Errors
    /// Returns [`SmartbetError::SolvencyViolation`] if they differ.
    pub fn verify_against(&self, actual_custody: Amount) -> Result<()> {
        let expected = self.expected_custody();
        if actual_custody != expected {
            return Err(SmartbetError::SolvencyViolation {
                reason: format!(
                    "substrate custody {actual_custody} != expected {expected} \
                     (stakes={}, paid_out={})",
                    self.stakes_received, self.paid_out,
                ),
            });
        }
        Ok(())
    }
}
