use chrono::Utc;

use crate::domain::{PerformanceSnapshot, Trade, TradeStatus};

/// Fold a trade history into a performance snapshot: sum of profit, count of
/// all attempts, and SUCCESS count over all attempts. Failed trades stay in
/// the denominator. The incremental counters kept by the paper trader must
/// always match this fold over the same logical history.
pub fn recompute<'a, I>(trades: I) -> PerformanceSnapshot
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut total_pnl = 0.0;
    let mut executed = 0u64;
    let mut succeeded = 0u64;

    for trade in trades {
        total_pnl += trade.profit;
        executed += 1;
        if trade.status == TradeStatus::Success {
            succeeded += 1;
        }
    }

    PerformanceSnapshot {
        total_pnl,
        trades_executed: executed,
        success_rate: if executed == 0 {
            0.0
        } else {
            succeeded as f64 / executed as f64
        },
        last_updated: Utc::now(),
    }
}
