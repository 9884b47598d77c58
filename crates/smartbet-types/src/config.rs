//! Engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, Principal, SmartbetError, constants};

/// How a finished match's stakes are turned into winnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutPolicy {
    /// Each exact-score winner is credited their own stake back.
    /// Losing stakes stay with the house.
    #[default]
    RefundStake,
    /// The whole match pot is divided among exact-score winners pro rata
    /// to stake. With no winners the house keeps the pot.
    SplitPot,
}

/// Configuration fixed at engine initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The only principal allowed to run privileged operations.
    pub owner: Principal,
    /// Exact stake required for every bet.
    #[serde(default = "default_entry_fee")]
    pub entry_fee: Amount,
    #[serde(default)]
    pub payout_policy: PayoutPolicy,
    /// Decimal places kept when splitting pots.
    #[serde(default = "default_amount_scale")]
    pub amount_scale: u32,
}

fn default_entry_fee() -> Amount {
    constants::DEFAULT_ENTRY_FEE
}

fn default_amount_scale() -> u32 {
    constants::DEFAULT_AMOUNT_SCALE
}

impl EngineConfig {
    /// Defaults for everything but the owner.
    #[must_use]
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            entry_fee: default_entry_fee(),
            payout_policy: PayoutPolicy::default(),
            amount_scale: default_amount_scale(),
        }
    }

    #[must_use]
    pub fn with_entry_fee(mut self, entry_fee: Amount) -> Self {
        self.entry_fee = entry_fee;
        self
    }

    #[must_use]
    pub fn with_payout_policy(mut self, policy: PayoutPolicy) -> Self {
        self.payout_policy = policy;
        self
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.owner.is_zero() {
            return Err(SmartbetError::Configuration(
                "owner must not be the zero principal".into(),
            ));
        }
        if self.entry_fee <= Decimal::ZERO {
            return Err(SmartbetError::Configuration(format!(
                "entry_fee must be positive, got {}",
                self.entry_fee
            )));
        }
        if self.amount_scale > constants::MAX_AMOUNT_SCALE {
            return Err(SmartbetError::Configuration(format!(
                "amount_scale {} exceeds maximum {}",
                self.amount_scale,
                constants::MAX_AMOUNT_SCALE
            )));
        }
        if self.entry_fee.normalize().scale() > self.amount_scale {
            return Err(SmartbetError::Configuration(format!(
                "entry_fee {} has more than {} decimal places",
                self.entry_fee, self.amount_scale
            )));
        }
        Ok(())
    }
}
