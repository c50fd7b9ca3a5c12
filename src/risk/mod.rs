//! Risk management module
//!
//! Capital/loss budget arithmetic over the portfolio configuration,
//! admission control for new orders, time-based loss acceptance, position
//! sizing strategies and position bookkeeping.

mod budget;
mod kelly;
mod limits;
mod position;
mod sizing;
mod types;

pub use budget::{RiskBudget, RiskMetrics};
pub use kelly::KellyCalculator;
pub use position::{Position, PositionBook};
pub use sizing::{
    create_sizer, EqualWeightSizer, FixedAmountSizer, KellySizer, PositionSizer, RiskParitySizer,
    SizingInput,
};
pub use types::RiskError;
