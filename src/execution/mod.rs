//! Execution engine module
//!
//! Order submission and the urgency-driven execution policy: high urgency
//! sells go to market immediately with a single retry, medium urgency tries
//! a limit near the current price before falling back to market, low urgency
//! rests a standard limit order.

mod paper;
mod types;

pub use paper::PaperEngine;
pub use types::{
    ExecutionError, ExecutionPlan, Fill, Order, OrderId, OrderSide, OrderStatus, OrderType,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Trait for execution engine implementations
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Submit an order and wait for its fill
    async fn submit_order(&self, order: &Order) -> Result<Fill, ExecutionError>;
    /// Cancel an order
    async fn cancel_order(&self, id: OrderId) -> Result<(), ExecutionError>;
    /// Get all fills
    async fn get_fills(&self) -> Vec<Fill>;
}

/// Limit price offset from `price` in the favourable direction for the side
pub fn limit_price(side: OrderSide, price: Decimal, offset_percentage: Decimal) -> Decimal {
    let offset = price * offset_percentage / Decimal::ONE_HUNDRED;
    match side {
        OrderSide::Sell => price + offset,
        OrderSide::Buy => price - offset,
    }
}

fn filled(mut order: Order, fill: &Fill) -> Order {
    order.status = OrderStatus::Filled;
    order.price = fill.price;
    order
}

/// Work an order according to `plan`.
///
/// Returns `Ok(None)` for [`ExecutionPlan::NoOrder`].
pub async fn execute_plan(
    engine: &dyn ExecutionEngine,
    symbol: &str,
    side: OrderSide,
    quantity: Decimal,
    price: Decimal,
    plan: ExecutionPlan,
    limit_offset_percentage: Decimal,
) -> Result<Option<(Order, Fill)>, ExecutionError> {
    match plan {
        ExecutionPlan::NoOrder => Ok(None),
        ExecutionPlan::Market { retry } => {
            let order = Order::new(symbol, side, OrderType::Market, price, quantity);
            match engine.submit_order(&order).await {
                Ok(fill) => Ok(Some((filled(order, &fill), fill))),
                Err(e) if retry => {
                    warn!(symbol, error = %e, "Market order failed, retrying once");
                    let order = Order::new(symbol, side, OrderType::Market, price, quantity);
                    let fill = engine.submit_order(&order).await?;
                    Ok(Some((filled(order, &fill), fill)))
                }
                Err(e) => Err(e),
            }
        }
        ExecutionPlan::LimitThenMarket { limit_timeout } => {
            let limit = limit_price(side, price, limit_offset_percentage);
            let order = Order::new(symbol, side, OrderType::Limit, limit, quantity);
            match tokio::time::timeout(limit_timeout, engine.submit_order(&order)).await {
                Ok(Ok(fill)) => return Ok(Some((filled(order, &fill), fill))),
                Ok(Err(e)) => warn!(symbol, error = %e, "Limit order failed, falling back to market"),
                Err(_) => {
                    info!(symbol, ?limit_timeout, "Limit order unfilled, falling back to market");
                    if let Err(e) = engine.cancel_order(order.id).await {
                        warn!(symbol, error = %e, "Failed to cancel resting limit order");
                    }
                }
            }

            let order = Order::new(symbol, side, OrderType::Market, price, quantity);
            let fill = engine.submit_order(&order).await?;
            Ok(Some((filled(order, &fill), fill)))
        }
        ExecutionPlan::Limit => {
            let limit = limit_price(side, price, limit_offset_percentage);
            let order = Order::new(symbol, side, OrderType::Limit, limit, quantity);
            let fill = engine.submit_order(&order).await?;
            Ok(Some((filled(order, &fill), fill)))
        }
    }
}
