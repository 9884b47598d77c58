//! User slots.
//!
//! A slot is never physically erased. `remove_user` resets it to defaults
//! and bumps `generation`, so bets placed under an older generation are
//! recognisably stale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, Principal};

/// One user slot in the Users table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// `Some(principal)` while registered, `None` otherwise.
    pub addr: Option<Principal>,
    /// Banned users cannot bet or withdraw.
    pub banned: bool,
    /// Owner-adjustable auxiliary balance. Not winnings, not custody.
    pub balance: Amount,
    /// Incremented on every removal.
    pub generation: u64,
}

impl User {
    #[must_use]
    pub fn new() -> Self {
        Self {
            addr: None,
            banned: false,
            balance: Decimal::ZERO,
            generation: 0,
        }
    }

    #[must_use]
    pub fn registered(&self) -> bool {
        self.addr.is_some()
    }

    /// Reset to defaults, keeping only the bumped generation.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::new()
        };
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}
