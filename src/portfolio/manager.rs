//! Portfolio manager
//!
//! Owns open positions and order history, runs the decision engine over
//! every position each cycle, works sells according to their urgency and
//! admits new entries against the risk budget.

use super::types::{ClosedPosition, CycleReport, PortfolioError};
use crate::config::ExecutionConfig;
use crate::engine::{Recommendation, SmartLossManager};
use crate::execution::{execute_plan, ExecutionEngine, ExecutionPlan, Order, OrderSide};
use crate::risk::{Position, PositionBook, RiskBudget, RiskError, RiskMetrics};
use crate::telemetry::{self, LatencyMetric};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Strategy label stamped on positions opened here
pub const ENTRY_STRATEGY: &str = "smart_loss";

#[derive(Debug, Default)]
struct PortfolioState {
    positions: PositionBook,
    orders: Vec<Order>,
    /// Symbols with an entry order in flight
    entering: HashSet<String>,
}

/// Orchestrates evaluation, execution and risk accounting
pub struct PortfolioManager {
    engine: Arc<SmartLossManager>,
    executor: Arc<dyn ExecutionEngine>,
    execution: ExecutionConfig,
    state: RwLock<PortfolioState>,
}

impl PortfolioManager {
    pub fn new(
        engine: Arc<SmartLossManager>,
        executor: Arc<dyn ExecutionEngine>,
        execution: ExecutionConfig,
    ) -> Self {
        Self {
            engine,
            executor,
            execution,
            state: RwLock::new(PortfolioState::default()),
        }
    }

    pub fn engine(&self) -> &Arc<SmartLossManager> {
        &self.engine
    }

    fn limit_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.limit_timeout_secs)
    }

    /// Snapshot of open positions
    pub async fn positions(&self) -> Vec<Position> {
        self.state.read().await.positions.iter().cloned().collect()
    }

    /// Snapshot of order history
    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    /// Risk budget recomputed from current orders and marks
    pub async fn budget(&self) -> RiskBudget {
        let config = self.engine.config().await;
        let state = self.state.read().await;
        RiskMetrics::recompute(&config, &state.orders, state.positions.iter())
    }

    /// Track a position opened elsewhere
    pub async fn adopt(&self, position: Position) -> Result<(), PortfolioError> {
        let config = self.engine.config().await;
        let mut state = self.state.write().await;
        let symbol = &position.symbol;
        if state.positions.contains(symbol) || state.entering.contains(symbol) {
            return Err(RiskError::DuplicatePosition(position.symbol).into());
        }
        if state.positions.len() + state.entering.len() >= config.max_active_symbols {
            return Err(RiskError::MaxSymbolsReached(config.max_active_symbols).into());
        }
        info!(symbol = %position.symbol, entry = %position.entry_price, "Adopted position");
        state.positions.open(position);
        Ok(())
    }

    /// Size, admit and open a new position with a market buy.
    ///
    /// Open positions and entries still being submitted both count toward
    /// the symbol and concurrent order limits. The state lock is released
    /// while the order is worked.
    pub async fn try_open(
        &self,
        symbol: &str,
        price: Decimal,
        volatility: f64,
        win_rate: f64,
    ) -> Result<Position, PortfolioError> {
        let config = self.engine.config().await;
        let size = {
            let mut state = self.state.write().await;
            if state.positions.contains(symbol) || state.entering.contains(symbol) {
                return Err(RiskError::DuplicatePosition(symbol.to_string()).into());
            }
            let active = state.positions.len() + state.entering.len();
            if active >= config.max_active_symbols {
                return Err(RiskError::MaxSymbolsReached(config.max_active_symbols).into());
            }

            let size = config.calculate_optimal_position_size(symbol, volatility, win_rate);
            if size < config.min_position_size || price <= Decimal::ZERO {
                return Err(RiskError::PositionTooSmall(size).into());
            }

            let budget = RiskMetrics::recompute(&config, &state.orders, state.positions.iter());
            let pending = state.orders.iter().filter(|o| o.is_active()).count();
            config.check_new_order(budget.total_risk, size, active + pending)?;

            state.entering.insert(symbol.to_string());
            size
        };

        let quantity = size / price;
        let started = Instant::now();
        let executed = execute_plan(
            self.executor.as_ref(),
            symbol,
            OrderSide::Buy,
            quantity,
            price,
            ExecutionPlan::Market { retry: false },
            self.execution.limit_offset_percentage,
        )
        .await;
        telemetry::record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        let mut state = self.state.write().await;
        state.entering.remove(symbol);

        let Some((order, fill)) = executed.inspect_err(|_| telemetry::record_order("failed"))?
        else {
            return Err(RiskError::PositionTooSmall(size).into());
        };
        telemetry::record_order("filled");

        let position = Position::from_fill(&fill, &config, ENTRY_STRATEGY);
        info!(
            symbol,
            %size,
            entry = %position.entry_price,
            stop_loss = %position.stop_loss,
            take_profit = %position.take_profit,
            "Opened position"
        );
        state.orders.push(order);
        state.positions.open(position.clone());
        Ok(position)
    }

    /// Run one cycle at the current time
    pub async fn run_cycle(&self, prices: &HashMap<String, Decimal>) -> CycleReport {
        self.run_cycle_at(prices, Utc::now()).await
    }

    /// Mark, evaluate, execute sells and recompute risk as of `now`
    pub async fn run_cycle_at(
        &self,
        prices: &HashMap<String, Decimal>,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let mut skipped = Vec::new();
        let mut to_evaluate = Vec::new();
        {
            let mut state = self.state.write().await;
            for symbol in state.positions.symbols() {
                match prices.get(&symbol) {
                    Some(&price) => {
                        state.positions.update_mark(&symbol, price);
                        if let Some(position) = state.positions.get(&symbol) {
                            to_evaluate.push((position.clone(), price));
                        }
                    }
                    None => {
                        warn!(symbol = %symbol, "No price this cycle, skipping evaluation");
                        skipped.push(symbol);
                    }
                }
            }
        }

        let mut tasks = JoinSet::new();
        for (position, price) in to_evaluate {
            let engine = Arc::clone(&self.engine);
            tasks.spawn(async move {
                let recommendation = engine
                    .evaluate_at(&position.symbol, &position, price, now)
                    .await;
                (position, price, recommendation)
            });
        }

        let mut evaluated = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => evaluated.push(result),
                Err(e) => warn!(error = %e, "Evaluation task failed"),
            }
        }
        evaluated.sort_by(|a, b| a.0.symbol.cmp(&b.0.symbol));

        let mut closed = Vec::new();
        let mut failures = Vec::new();
        for (position, price, recommendation) in &evaluated {
            if !recommendation.is_sell() {
                continue;
            }
            match self.sell(position, *price, recommendation).await {
                Ok(Some(done)) => closed.push(done),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        symbol = %position.symbol,
                        reason = %recommendation.decision,
                        error = %e,
                        "Sell failed, position stays open"
                    );
                    failures.push((position.symbol.clone(), e.to_string()));
                }
            }
        }

        let purged = self.engine.history().purge_expired(now);
        if purged > 0 {
            info!(purged, "Purged expired metric history");
        }

        let budget = self.budget().await;
        let open_positions = self.state.read().await.positions.len();
        telemetry::record_budget(&budget, open_positions);
        if budget.is_exhausted() {
            warn!(
                total_risk = %budget.total_risk,
                limit = %budget.max_total_loss_amount,
                "Risk budget exhausted"
            );
        }

        CycleReport {
            recommendations: evaluated
                .into_iter()
                .map(|(position, _, recommendation)| (position.symbol, recommendation))
                .collect(),
            closed,
            failures,
            skipped,
            budget,
        }
    }

    async fn sell(
        &self,
        position: &Position,
        price: Decimal,
        recommendation: &Recommendation,
    ) -> Result<Option<ClosedPosition>, PortfolioError> {
        let plan = ExecutionPlan::for_urgency(recommendation.urgency(), self.limit_timeout());
        let started = Instant::now();
        let executed = execute_plan(
            self.executor.as_ref(),
            &position.symbol,
            OrderSide::Sell,
            position.quantity,
            price,
            plan,
            self.execution.limit_offset_percentage,
        )
        .await;
        telemetry::record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        let Some((mut order, fill)) = executed.inspect_err(|_| telemetry::record_order("failed"))?
        else {
            return Ok(None);
        };
        telemetry::record_order("filled");

        let realized_pnl = position.realized_pnl(fill.price, fill.quantity, fill.fees);
        order.realized_pnl = Some(realized_pnl);

        let mut state = self.state.write().await;
        state.orders.push(order);
        state.positions.close(&position.symbol);

        info!(
            symbol = %position.symbol,
            reason = %recommendation.decision,
            exit = %fill.price,
            %realized_pnl,
            "Closed position"
        );
        Ok(Some(ClosedPosition {
            symbol: position.symbol.clone(),
            decision: recommendation.decision,
            entry_price: position.entry_price,
            exit_price: fill.price,
            quantity: fill.quantity,
            realized_pnl,
        }))
    }
}
