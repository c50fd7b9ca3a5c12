//! Paper trading execution engine

use super::{ExecutionEngine, ExecutionError, Fill, Order, OrderId, OrderType};
use chrono::Utc;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Paper trading execution engine with simulated fills
pub struct PaperEngine {
    fee_rate: Decimal,
    fills: Arc<RwLock<Vec<Fill>>>,
    /// Time a limit order rests before it fills
    limit_latency: Option<Duration>,
    /// Number of upcoming submissions to reject
    pending_rejections: AtomicUsize,
}

impl PaperEngine {
    /// Create a new paper trading engine
    pub fn new(fee_rate: Decimal) -> Self {
        Self {
            fee_rate,
            fills: Arc::new(RwLock::new(vec![])),
            limit_latency: None,
            pending_rejections: AtomicUsize::new(0),
        }
    }

    /// Simulate limit orders resting on the book before filling
    pub fn with_limit_latency(mut self, latency: Duration) -> Self {
        self.limit_latency = Some(latency);
        self
    }

    /// Reject the next `count` submissions
    pub fn reject_next(&self, count: usize) {
        self.pending_rejections.store(count, Ordering::SeqCst);
    }

    fn take_rejection(&self) -> bool {
        self.pending_rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ExecutionEngine for PaperEngine {
    async fn submit_order(&self, order: &Order) -> Result<Fill, ExecutionError> {
        if self.take_rejection() {
            tracing::warn!(order_id = %order.id, symbol = %order.symbol, "Paper order rejected");
            return Err(ExecutionError::Rejected(
                order.id,
                "simulated rejection".to_string(),
            ));
        }

        if order.order_type == OrderType::Limit {
            if let Some(latency) = self.limit_latency {
                tokio::time::sleep(latency).await;
            }
        }

        // Simulate fill at order price
        let fees = order.quantity * order.price * self.fee_rate;
        let fill = Fill {
            order_id: order.id,
            symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            price: order.price,
            quantity: order.quantity,
            timestamp: Utc::now(),
            fees,
        };

        let mut fills = self.fills.write().await;
        fills.push(fill.clone());

        tracing::info!(order_id = %order.id, symbol = %order.symbol, side = ?order.side, "Paper order filled");
        Ok(fill)
    }

    async fn cancel_order(&self, id: OrderId) -> Result<(), ExecutionError> {
        tracing::info!(%id, "Paper order cancelled");
        Ok(())
    }

    async fn get_fills(&self) -> Vec<Fill> {
        let fills = self.fills.read().await;
        fills.clone()
    }
}
