//! Position tracking

use crate::config::PortfolioConfig;
use crate::execution::Fill;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An open long position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Buy order that opened the position
    pub order_id: Uuid,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub entry_time: DateTime<Utc>,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Strategy label that opened the position
    pub strategy: String,
    /// Entry signals, for the record
    #[serde(default)]
    pub signals: Vec<String>,
    /// Latest mark, annotated each cycle
    #[serde(default)]
    pub current_price: Option<Decimal>,
    /// Unrealized P&L at the latest mark
    #[serde(default)]
    pub unrealized_pnl: Decimal,
    /// Fees paid on the opening fill
    #[serde(default)]
    pub entry_fees: Decimal,
}

impl Position {
    /// Open from a buy fill, deriving stop-loss and take-profit levels from
    /// the configured percentages
    pub fn from_fill(fill: &Fill, config: &PortfolioConfig, strategy: impl Into<String>) -> Self {
        let stop_loss =
            fill.price * (Decimal::ONE - config.stop_loss_percentage / Decimal::ONE_HUNDRED);
        let take_profit =
            fill.price * (Decimal::ONE + config.take_profit_percentage / Decimal::ONE_HUNDRED);
        Self {
            symbol: fill.symbol.clone(),
            order_id: fill.order_id,
            entry_price: fill.price,
            quantity: fill.quantity,
            entry_time: fill.timestamp,
            stop_loss,
            take_profit,
            strategy: strategy.into(),
            signals: Vec::new(),
            current_price: None,
            unrealized_pnl: dec!(0),
            entry_fees: fill.fees,
        }
    }

    /// Realized P&L of closing at `exit_price`, net of entry and exit fees
    pub fn realized_pnl(
        &self,
        exit_price: Decimal,
        quantity: Decimal,
        exit_fees: Decimal,
    ) -> Decimal {
        (exit_price - self.entry_price) * quantity - self.entry_fees - exit_fees
    }

    /// Signed return since entry as a fraction (-0.05 = 5% down)
    pub fn pnl_fraction(&self, price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (price - self.entry_price) / self.entry_price
    }

    pub fn pnl(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) * self.quantity
    }

    /// Loss at `price` as a non-negative amount
    pub fn unrealized_loss(&self, price: Decimal) -> Decimal {
        (-self.pnl(price)).max(Decimal::ZERO)
    }

    pub fn cost_basis(&self) -> Decimal {
        self.entry_price * self.quantity
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.entry_time
    }

    /// Latest mark, or entry price if never marked
    pub fn mark_price(&self) -> Decimal {
        self.current_price.unwrap_or(self.entry_price)
    }
}

/// Open positions keyed by symbol
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, position: Position) {
        self.positions.insert(position.symbol.clone(), position);
    }

    pub fn close(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    /// Annotate a position with its current mark
    pub fn update_mark(&mut self, symbol: &str, price: Decimal) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.current_price = Some(price);
            position.unrealized_pnl = position.pnl(price);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of unrealized P&L at the latest marks
    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.unrealized_pnl).sum()
    }
}
