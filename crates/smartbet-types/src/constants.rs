//! System-wide constants for the SmartBet engine.

use rust_decimal::Decimal;

/// Default entry fee per bet: 0.01 units of the custody currency.
pub const DEFAULT_ENTRY_FEE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal places kept when splitting a pot among winners.
pub const DEFAULT_AMOUNT_SCALE: u32 = 18;

/// Largest scale `rust_decimal` can represent.
pub const MAX_AMOUNT_SCALE: u32 = 28;

/// Domain separator for label-derived principals.
pub const PRINCIPAL_LABEL_DOMAIN: &[u8] = b"smartbet:principal:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "SmartBet";
