//! User administration.

use smartbet_types::{Amount, Event, Principal, Result, SmartbetError, Timestamp};

use crate::book::Book;

impl Book {
    /// Register `caller`. Open to any principal, once per slot generation.
    pub fn register_user(&mut self, caller: Principal, now: Timestamp) -> Result<()> {
        let slot = self.store.user_mut(caller);
        if slot.registered() {
            return Err(SmartbetError::AlreadyRegistered(caller));
        }
        slot.addr = Some(caller);
        self.events.emit(Event::UserRegistered { user: caller }, now);
        Ok(())
    }

    /// Owner-only. Sets the slot's auxiliary balance to `amount`.
    pub fn update_user_balance(
        &mut self,
        caller: Principal,
        user: Principal,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        self.guard.require_owner(&caller)?;
        self.store.user_mut(user).balance = amount;
        self.events
            .emit(Event::UserBalanceUpdated { user, amount }, now);
        Ok(())
    }

    /// Owner-only. Banned users cannot bet or withdraw.
    pub fn ban_user(&mut self, caller: Principal, user: Principal, now: Timestamp) -> Result<()> {
        self.guard.require_owner(&caller)?;
        self.store.user_mut(user).banned = true;
        self.events.emit(Event::UserBanned { user }, now);
        Ok(())
    }

    /// Owner-only. Resets the slot to defaults.
    ///
    /// Winnings already credited stay withdrawable; bets placed before the
    /// removal no longer win.
    pub fn remove_user(&mut self, caller: Principal, user: Principal, now: Timestamp) -> Result<()> {
        self.guard.require_owner(&caller)?;
        self.store.user_mut(user).reset();
        self.events.emit(Event::UserRemoved { user }, now);
        Ok(())
    }
}
