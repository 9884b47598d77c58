//! Access control guard in front of every mutating operation.
//!
//! Capability checks are plain functions of the caller identity and the
//! user slot. Entry points call the guards they need, in order, before any
//! write; a failed guard leaves the store untouched.

use smartbet_types::{Principal, Result, SmartbetError};

use crate::store::LedgerStore;

/// Owner / banned / registered policy.
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    owner: Principal,
}

impl AccessGuard {
    #[must_use]
    pub fn new(owner: Principal) -> Self {
        Self { owner }
    }

    #[must_use]
    pub fn owner(&self) -> Principal {
        self.owner
    }

    #[must_use]
    pub fn is_owner(&self, caller: &Principal) -> bool {
        *caller == self.owner
    }

    /// # Errors
    /// [`SmartbetError::Unauthorized`] unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Principal) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            tracing::warn!(
                caller = %caller.short(),
                "Privileged call rejected: caller is not the owner"
            );
            Err(SmartbetError::Unauthorized { caller: *caller })
        }
    }

    /// # Errors
    /// [`SmartbetError::UserBanned`] if the principal's slot is banned.
    pub fn require_not_banned(&self, store: &LedgerStore, principal: &Principal) -> Result<()> {
        match store.user(principal) {
            Some(user) if user.banned => {
                tracing::warn!(user = %principal.short(), "Call rejected: user is banned");
                Err(SmartbetError::UserBanned(*principal))
            }
            _ => Ok(()),
        }
    }

    /// # Errors
    /// [`SmartbetError::NotRegistered`] unless the principal is registered.
    pub fn require_registered(&self, store: &LedgerStore, principal: &Principal) -> Result<()> {
        if store.user(principal).is_some_and(|u| u.registered()) {
            Ok(())
        } else {
            Err(SmartbetError::NotRegistered(*principal))
        }
    }
}
