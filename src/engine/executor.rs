use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use eyre::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::database::Database;
use crate::config::ExecutionConfig;
use crate::domain::{Opportunity, PerformanceSnapshot, Trade, TradeStatus};

/// Simulate a single fill attempt. One uniform draw decides success; a
/// successful fill pays the nominal edge minus a uniform slippage draw. The
/// profit is not clamped at zero: slippage past the edge is a real cost.
pub fn simulate_fill(
    opportunity: &Opportunity,
    config: &ExecutionConfig,
    rng: &mut impl Rng,
) -> Trade {
    let succeeded = rng.gen::<f64>() < config.success_probability;

    let profit = if succeeded {
        let slippage = if config.slippage_min < config.slippage_max {
            rng.gen_range(config.slippage_min..=config.slippage_max)
        } else {
            config.slippage_min
        };
        opportunity.profit_per_share - slippage
    } else {
        0.0
    };

    Trade {
        id: Uuid::new_v4().to_string(),
        symbol: opportunity.symbol.clone(),
        strategy: format!("{} -> {}", opportunity.buy_venue, opportunity.sell_venue),
        profit,
        timestamp: Utc::now(),
        status: if succeeded {
            TradeStatus::Success
        } else {
            TradeStatus::Failed
        },
    }
}

struct TraderState {
    /// Bounded retention window, most-recent-first.
    history: VecDeque<Trade>,
    /// All-time counters, independent of the retention window.
    total_pnl: f64,
    trades_executed: u64,
    failed: u64,
}

impl TraderState {
    fn record(&mut self, trade: Trade, cap: usize) {
        self.total_pnl += trade.profit;
        self.trades_executed += 1;
        if trade.status == TradeStatus::Failed {
            self.failed += 1;
        }
        self.history.push_front(trade);
        self.history.truncate(cap);
    }

    fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            total_pnl: self.total_pnl,
            trades_executed: self.trades_executed,
            success_rate: if self.trades_executed == 0 {
                0.0
            } else {
                (self.trades_executed - self.failed) as f64 / self.trades_executed as f64
            },
            last_updated: Utc::now(),
        }
    }
}

/// Paper execution engine. Each `execute` call produces exactly one trade
/// and folds it into the history and the all-time counters under a single
/// write lock, so concurrent executions never skew the totals against the
/// recorded history.
#[derive(Clone)]
pub struct PaperTrader {
    config: ExecutionConfig,
    state: Arc<RwLock<TraderState>>,
}

impl PaperTrader {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(TraderState {
                history: VecDeque::new(),
                total_pnl: 0.0,
                trades_executed: 0,
                failed: 0,
            })),
        }
    }

    /// Attempt one opportunity. Callers must not re-submit the same
    /// opportunity instance; a failed attempt is final.
    pub async fn execute(&self, opportunity: &Opportunity, rng: &mut impl Rng) -> Trade {
        let trade = simulate_fill(opportunity, &self.config, rng);
        let mut state = self.state.write().await;
        state.record(trade.clone(), self.config.history_cap);
        trade
    }

    pub async fn snapshot(&self) -> PerformanceSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn recent_trades(&self) -> Vec<Trade> {
        self.state.read().await.history.iter().cloned().collect()
    }
}

/// Single consumer of the ranked-opportunity channel. Receiving an
/// opportunity is what marks it consumed: the sender gives up ownership, so
/// no opportunity instance can reach `execute` twice.
pub struct ExecutionLoop {
    trader: PaperTrader,
    db: Database,
    opportunity_rx: mpsc::Receiver<Opportunity>,
}

impl ExecutionLoop {
    pub fn new(
        trader: PaperTrader,
        db: Database,
        opportunity_rx: mpsc::Receiver<Opportunity>,
    ) -> Self {
        Self {
            trader,
            db,
            opportunity_rx,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Execution loop started");
        let mut rng = StdRng::from_entropy();

        while let Some(opportunity) = self.opportunity_rx.recv().await {
            let trade = self.trader.execute(&opportunity, &mut rng).await;
            match trade.status {
                TradeStatus::Success => info!(
                    "EXECUTED {} {} | profit ${:.3}",
                    trade.symbol, trade.strategy, trade.profit
                ),
                TradeStatus::Failed => warn!("FAILED {} {} | no fill", trade.symbol, trade.strategy),
            }

            let snapshot = self.trader.snapshot().await;
            if let Err(e) = self.db.push_trade(&trade).await {
                error!("Failed to persist trade {}: {:?}", trade.id, e);
            }
            if let Err(e) = self.db.put_performance(&snapshot).await {
                error!("Failed to persist performance snapshot: {:?}", e);
            }
        }

        info!("Opportunity channel closed, execution loop shutting down");
        Ok(())
    }
}
