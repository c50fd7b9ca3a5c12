//! Derived capital values and the recomputed risk budget

use super::position::Position;
use crate::config::PortfolioConfig;
use crate::execution::{Order, OrderSide, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

impl PortfolioConfig {
    /// Hard cap on cumulative loss
    pub fn max_total_loss_amount(&self) -> Decimal {
        self.total_capital * self.max_loss_percentage / Decimal::ONE_HUNDRED
    }

    /// Capital never deployed
    pub fn reserve_amount(&self) -> Decimal {
        self.total_capital * self.reserve_percentage / Decimal::ONE_HUNDRED
    }

    pub fn available_capital(&self) -> Decimal {
        self.total_capital - self.reserve_amount()
    }

    /// Configured maximum, tightened to an even split of available capital
    pub fn max_position_size_calculated(&self) -> Decimal {
        let per_symbol = self.available_capital() / Decimal::from(self.max_active_symbols.max(1));
        self.max_position_size.min(per_symbol)
    }

    /// Loss counted against the budget.
    ///
    /// Realized losses always count. Unrealized losses count only when
    /// enabled, scaled by `unrealized_loss_weight`, and never when
    /// `only_realized_losses` is set.
    pub fn calculate_total_risk(&self, realized_loss: Decimal, unrealized_loss: Decimal) -> Decimal {
        if self.only_realized_losses || !self.include_unrealized_in_risk {
            return realized_loss;
        }
        realized_loss + unrealized_loss * self.unrealized_loss_weight
    }
}

/// Capital and loss state for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBudget {
    pub max_total_loss_amount: Decimal,
    pub reserve_amount: Decimal,
    pub available_capital: Decimal,
    /// Losses from filled sells, as a positive amount
    pub realized_loss: Decimal,
    /// Paper losses on open positions at their marks, as a positive amount
    pub unrealized_loss: Decimal,
    /// Marked value of open positions
    pub total_exposure: Decimal,
    /// Loss counted against the budget under the configured policy
    pub total_risk: Decimal,
}

impl RiskBudget {
    /// Budget left before the loss cap
    pub fn remaining(&self) -> Decimal {
        (self.max_total_loss_amount - self.total_risk).max(Decimal::ZERO)
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_risk >= self.max_total_loss_amount
    }
}

/// Rebuilds the risk budget from order history and current marks.
///
/// Nothing is carried between cycles as a running delta.
pub struct RiskMetrics;

impl RiskMetrics {
    pub fn recompute<'a>(
        config: &PortfolioConfig,
        orders: &[Order],
        positions: impl IntoIterator<Item = &'a Position>,
    ) -> RiskBudget {
        let realized_loss: Decimal = orders
            .iter()
            .filter(|o| o.side == OrderSide::Sell && o.status == OrderStatus::Filled)
            .filter_map(|o| o.realized_pnl)
            .filter(|pnl| pnl.is_sign_negative())
            .map(|pnl| -pnl)
            .sum();

        let (unrealized_loss, total_exposure) = positions.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(loss, exposure), position| {
                let mark = position.mark_price();
                (
                    loss + position.unrealized_loss(mark),
                    exposure + mark * position.quantity,
                )
            },
        );

        RiskBudget {
            max_total_loss_amount: config.max_total_loss_amount(),
            reserve_amount: config.reserve_amount(),
            available_capital: config.available_capital(),
            realized_loss,
            unrealized_loss,
            total_exposure,
            total_risk: config.calculate_total_risk(realized_loss, unrealized_loss),
        }
    }
}
