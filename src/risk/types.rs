//! Risk management types

use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a new order is refused
#[derive(Debug, Error, PartialEq)]
pub enum RiskError {
    /// Worst-case loss of the order would breach the loss budget
    #[error("Loss budget exceeded: risk {projected} > limit {limit}")]
    LossBudgetExceeded { projected: Decimal, limit: Decimal },
    /// Maximum concurrent orders reached
    #[error("Maximum concurrent orders reached ({0})")]
    MaxOrdersReached(usize),
    /// Maximum active symbols reached
    #[error("Maximum active symbols reached ({0})")]
    MaxSymbolsReached(usize),
    /// Symbol already has an open position
    #[error("Position already open for {0}")]
    DuplicatePosition(String),
    /// Computed order is too small to place
    #[error("Position size {0} below minimum")]
    PositionTooSmall(Decimal),
}
