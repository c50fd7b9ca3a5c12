//! Execution types

use crate::engine::Urgency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order (immediate execution)
    Market,
    /// Limit order (price specified)
    Limit,
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

/// An order and its bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Limit price, or reference price for market orders
    pub price: Decimal,
    pub quantity: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    /// Realized P&L, set when a sell fills
    pub realized_pnl: Option<Decimal>,
}

impl Order {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            order_type,
            price,
            quantity,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            realized_pnl: None,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// A fill (executed trade)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
    pub fees: Decimal,
}

/// How an order should be worked, derived from recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPlan {
    /// Market order now; `retry` allows one more market attempt on failure
    Market { retry: bool },
    /// Limit near the current price, then market if unfilled by the deadline
    LimitThenMarket { limit_timeout: Duration },
    /// Standard limit order
    Limit,
    /// Nothing to execute
    NoOrder,
}

impl ExecutionPlan {
    pub fn for_urgency(urgency: Urgency, limit_timeout: Duration) -> Self {
        match urgency {
            Urgency::High => ExecutionPlan::Market { retry: true },
            Urgency::Medium => ExecutionPlan::LimitThenMarket { limit_timeout },
            Urgency::Low => ExecutionPlan::Limit,
            Urgency::None => ExecutionPlan::NoOrder,
        }
    }
}

/// Execution errors
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Order {0} rejected: {1}")]
    Rejected(OrderId, String),
    #[error("Order {0} not filled within {1:?}")]
    Timeout(OrderId, Duration),
    #[error("Unknown order {0}")]
    UnknownOrder(OrderId),
}
