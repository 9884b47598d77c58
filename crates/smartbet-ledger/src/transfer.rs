//! Funds transfer seam.
//!
//! Everything that moves real value goes through [`FundsTransfer`]:
//! stakes are pulled into custody with `deposit`, winnings are paid out
//! with `withdraw`. The engine never touches balances outside this trait,
//! so settlement logic is testable against [`InMemoryWallet`].

use std::{collections::HashMap, future::Future, sync::Arc};

use rust_decimal::Decimal;
use smartbet_types::{Amount, Principal, Result, SmartbetError};
use tokio::sync::Mutex;

/// Narrow interface to the custody substrate.
pub trait FundsTransfer: Send + Sync {
    /// Move `amount` from `from`'s wallet into custody.
    fn deposit(&self, from: Principal, amount: Amount) -> impl Future<Output = Result<()>> + Send;

    /// Move `amount` from custody to `to`'s wallet.
    ///
    /// A dropped future must leave the transfer either fully applied or not
    /// applied at all; the engine treats a cancelled payout as not sent.
    fn withdraw(&self, to: Principal, amount: Amount) -> impl Future<Output = Result<()>> + Send;

    /// Wallet balance of `owner` outside custody.
    fn balance(&self, owner: Principal) -> impl Future<Output = Amount> + Send;

    /// Funds currently held in custody.
    fn custody_balance(&self) -> impl Future<Output = Amount> + Send;
}

impl<T: FundsTransfer + ?Sized> FundsTransfer for Arc<T> {
    fn deposit(&self, from: Principal, amount: Amount) -> impl Future<Output = Result<()>> + Send {
        (**self).deposit(from, amount)
    }

    fn withdraw(&self, to: Principal, amount: Amount) -> impl Future<Output = Result<()>> + Send {
        (**self).withdraw(to, amount)
    }

    fn balance(&self, owner: Principal) -> impl Future<Output = Amount> + Send {
        (**self).balance(owner)
    }

    fn custody_balance(&self) -> impl Future<Output = Amount> + Send {
        (**self).custody_balance()
    }
}

#[derive(Debug, Default)]
struct WalletState {
    accounts: HashMap<Principal, Amount>,
    custody: Amount,
    /// Charged to the recipient of every successful withdrawal.
    transfer_cost: Amount,
    /// Number of upcoming withdrawals to reject.
    failing_withdrawals: usize,
}

/// In-process custody substrate: per-principal wallets plus one custody pot.
///
/// Every transfer is all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryWallet {
    state: Mutex<WalletState>,
}

impl InMemoryWallet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet that charges `cost` to the recipient of every payout,
    /// standing in for the caller-paid transaction cost of a real chain.
    #[must_use]
    pub fn with_transfer_cost(cost: Amount) -> Self {
        Self {
            state: Mutex::new(WalletState {
                transfer_cost: cost,
                ..WalletState::default()
            }),
        }
    }

    /// Credit `owner`'s wallet from outside the system.
    pub async fn fund(&self, owner: Principal, amount: Amount) {
        let mut state = self.state.lock().await;
        *state.accounts.entry(owner).or_insert(Decimal::ZERO) += amount;
    }

    /// Reject the next `n` withdrawals with [`SmartbetError::TransferFailed`].
    pub async fn fail_next_withdrawals(&self, n: usize) {
        self.state.lock().await.failing_withdrawals = n;
    }

    pub async fn transfer_cost(&self) -> Amount {
        self.state.lock().await.transfer_cost
    }
}

impl FundsTransfer for InMemoryWallet {
    async fn deposit(&self, from: Principal, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        let available = state.accounts.get(&from).copied().unwrap_or(Decimal::ZERO);
        if available < amount {
            return Err(SmartbetError::TransferFailed {
                reason: format!("wallet {from} holds {available}, needs {amount}"),
            });
        }
        state.accounts.insert(from, available - amount);
        state.custody += amount;
        Ok(())
    }

    async fn withdraw(&self, to: Principal, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing_withdrawals > 0 {
            state.failing_withdrawals -= 1;
            return Err(SmartbetError::TransferFailed {
                reason: format!("transport rejected payout to {to}"),
            });
        }
        if state.custody < amount {
            return Err(SmartbetError::TransferFailed {
                reason: format!(
                    "insufficient liquidity: custody holds {}, payout {amount}",
                    state.custody
                ),
            });
        }
        let cost = state.transfer_cost;
        if cost > amount {
            return Err(SmartbetError::TransferFailed {
                reason: format!("payout {amount} does not cover transfer cost {cost}"),
            });
        }
        state.custody -= amount;
        *state.accounts.entry(to).or_insert(Decimal::ZERO) += amount - cost;
        Ok(())
    }

    async fn balance(&self, owner: Principal) -> Amount {
        self.state
            .lock()
            .await
            .accounts
            .get(&owner)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    async fn custody_balance(&self) -> Amount {
        self.state.lock().await.custody
    }
}
