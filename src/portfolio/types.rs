//! Portfolio orchestration types

use crate::engine::{Decision, Recommendation};
use crate::execution::ExecutionError;
use crate::risk::{RiskBudget, RiskError};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Why an entry or adoption was refused
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error(transparent)]
    Risk(#[from] RiskError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// A position closed during a cycle
#[derive(Debug, Clone, Serialize)]
pub struct ClosedPosition {
    pub symbol: String,
    pub decision: Decision,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    /// Net of fees
    pub realized_pnl: Decimal,
}

/// Outcome of one orchestration cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Recommendation per evaluated symbol, sorted by symbol
    pub recommendations: Vec<(String, Recommendation)>,
    pub closed: Vec<ClosedPosition>,
    /// Sells that could not be executed, with the error
    pub failures: Vec<(String, String)>,
    /// Positions with no price this cycle
    pub skipped: Vec<String>,
    pub budget: RiskBudget,
}

impl CycleReport {
    pub fn sells(&self) -> impl Iterator<Item = &(String, Recommendation)> {
        self.recommendations.iter().filter(|(_, r)| r.is_sell())
    }
}
