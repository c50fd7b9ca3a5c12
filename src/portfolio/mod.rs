//! Portfolio orchestration
//!
//! The caller of the decision engine: marks positions, asks for a
//! recommendation per position, turns urgency into an execution plan and
//! keeps the loss budget current.

mod manager;
mod types;

pub use manager::{PortfolioManager, ENTRY_STRATEGY};
pub use types::{ClosedPosition, CycleReport, PortfolioError};
