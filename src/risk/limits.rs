//! Admission control and time-based loss acceptance

use super::position::Position;
use super::types::RiskError;
use crate::config::PortfolioConfig;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

impl PortfolioConfig {
    /// Worst-case loss of an order: its stop-loss distance, not its notional
    pub fn worst_case_loss(&self, order_value: Decimal) -> Decimal {
        order_value * self.stop_loss_percentage / Decimal::ONE_HUNDRED
    }

    /// Admission test for a new order, with the refusal reason
    pub fn check_new_order(
        &self,
        current_risk: Decimal,
        order_value: Decimal,
        active_orders: usize,
    ) -> Result<(), RiskError> {
        let projected = current_risk + self.worst_case_loss(order_value);
        let limit = self.max_total_loss_amount();
        if projected > limit {
            return Err(RiskError::LossBudgetExceeded { projected, limit });
        }
        if active_orders >= self.max_concurrent_orders {
            return Err(RiskError::MaxOrdersReached(self.max_concurrent_orders));
        }
        Ok(())
    }

    pub fn can_place_new_order(
        &self,
        current_risk: Decimal,
        order_value: Decimal,
        active_orders: usize,
    ) -> bool {
        self.check_new_order(current_risk, order_value, active_orders)
            .is_ok()
    }

    /// Holding horizon
    pub fn holding_period(&self) -> Duration {
        Duration::days(i64::from(self.period_days))
    }

    /// Horizon plus grace period
    pub fn grace_deadline(&self) -> Duration {
        self.holding_period() + Duration::hours(i64::from(self.grace_period_hours))
    }

    /// Whether an overdue position's loss should be accepted.
    ///
    /// The position must be past its horizon, and then either past the grace
    /// period too or losing more than `accept_loss_threshold` percent.
    pub fn should_accept_loss(
        &self,
        position: &Position,
        current_price: Decimal,
        now: DateTime<Utc>,
    ) -> bool {
        let age = position.age(now);
        if age <= self.holding_period() {
            return false;
        }
        let loss_percentage = -position.pnl_fraction(current_price) * Decimal::ONE_HUNDRED;
        age > self.grace_deadline() || loss_percentage > self.accept_loss_threshold
    }
}
