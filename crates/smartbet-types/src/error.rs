//! Error types for the SmartBet engine.
//!
//! All errors use the `SB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access control errors
//! - 2xx: Registration errors
//! - 3xx: Match errors
//! - 4xx: Bet errors
//! - 5xx: Custody / withdrawal errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{MatchId, Principal, Timestamp};

/// Central error enum for all SmartBet operations.
#[derive(Debug, Error)]
pub enum SmartbetError {
    // =================================================================
    // Access Control Errors (1xx)
    // =================================================================
    /// The caller is not the configured owner.
    #[error("SB_ERR_100: Unauthorized: {caller} is not the owner")]
    Unauthorized { caller: Principal },

    /// The principal is banned.
    #[error("SB_ERR_101: User is banned: {0}")]
    UserBanned(Principal),

    // =================================================================
    // Registration Errors (2xx)
    // =================================================================
    /// `register_user` called twice for the same principal.
    #[error("SB_ERR_200: User already registered: {0}")]
    AlreadyRegistered(Principal),

    /// The caller must be registered for this operation.
    #[error("SB_ERR_201: User not registered: {0}")]
    NotRegistered(Principal),

    // =================================================================
    // Match Errors (3xx)
    // =================================================================
    /// No match with this id.
    #[error("SB_ERR_300: Match not found: {0}")]
    MatchNotFound(MatchId),

    /// `finish_match` called on a match that is already finished.
    #[error("SB_ERR_301: Match already finished: {0}")]
    AlreadyFinished(MatchId),

    /// A bet was placed on a finished match.
    #[error("SB_ERR_302: Match is finished: {0}")]
    MatchFinished(MatchId),

    /// A bet was placed at or after kick-off.
    #[error("SB_ERR_303: Betting closed for {match_id}: scheduled at {scheduled_at}, now {now}")]
    BettingClosed {
        match_id: MatchId,
        scheduled_at: Timestamp,
        now: Timestamp,
    },

    // =================================================================
    // Bet Errors (4xx)
    // =================================================================
    /// The stake does not equal the entry fee exactly.
    #[error("SB_ERR_400: Incorrect amount: expected {expected}, got {actual}")]
    IncorrectAmount { expected: Decimal, actual: Decimal },

    // =================================================================
    // Custody Errors (5xx)
    // =================================================================
    /// Nothing to withdraw.
    #[error("SB_ERR_500: No winnings to withdraw for {0}")]
    NoWinnings(Principal),

    /// The funds transfer substrate rejected the transfer.
    #[error("SB_ERR_501: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Outstanding winnings exceed funds held in custody. Critical alert.
    #[error("SB_ERR_502: Solvency invariant violation: {reason}")]
    SolvencyViolation { reason: String },

    /// A withdrawal ticket was driven through an illegal transition.
    #[error("SB_ERR_503: Invalid withdrawal: {reason}")]
    InvalidWithdrawal { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("SB_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl SmartbetError {
    /// Numeric code, e.g. `303` for [`SmartbetError::BettingClosed`].
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 100,
            Self::UserBanned(_) => 101,
            Self::AlreadyRegistered(_) => 200,
            Self::NotRegistered(_) => 201,
            Self::MatchNotFound(_) => 300,
            Self::AlreadyFinished(_) => 301,
            Self::MatchFinished(_) => 302,
            Self::BettingClosed { .. } => 303,
            Self::IncorrectAmount { .. } => 400,
            Self::NoWinnings(_) => 500,
            Self::TransferFailed { .. } => 501,
            Self::SolvencyViolation { .. } => 502,
            Self::InvalidWithdrawal { .. } => 503,
            Self::Internal(_) => 900,
            Self::Serialization(_) => 901,
            Self::Configuration(_) => 902,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SmartbetError>;

impl From<serde_json::Error> for SmartbetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
