use chrono::Utc;
use eyre::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::domain::{LatencySample, Opportunity, PerformanceSnapshot, Quote, Trade};

/// Per-symbol quote history retention, newest-first.
const QUOTE_HISTORY_CAP: i64 = 100;
/// Global executed-trade list retention, newest-first.
const TRADE_LIST_CAP: i64 = 100;

/// Store boundary for the pipeline. Records are kept as JSON payloads keyed
/// the way downstream consumers expect: quotes and opportunities by symbol,
/// latencies by venue, trades as a capped global list, performance as a
/// single field mapping. Expired rows are invisible to readers and swept by
/// `purge_expired`.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_path: &str) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", db_path);
        Self::connect(&url, 5).await
    }

    /// In-memory store. Single connection: each sqlite `:memory:`
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quote_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS latencies (
                venue TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS opportunities (
                symbol TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trades (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS performance (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_pnl REAL NOT NULL,
                trades_executed INTEGER NOT NULL,
                success_rate REAL NOT NULL,
                last_updated TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // --- Quotes ---

    pub async fn put_quote(&self, quote: &Quote, ttl_secs: i64) -> Result<()> {
        let payload = serde_json::to_string(quote)?;
        let expires_at = Utc::now().timestamp() + ttl_secs;

        sqlx::query(
            "INSERT INTO quotes (symbol, payload, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(symbol) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at",
        )
        .bind(&quote.symbol)
        .bind(&payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        sqlx::query("INSERT INTO quote_history (symbol, payload) VALUES (?, ?)")
            .bind(&quote.symbol)
            .bind(&payload)
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "DELETE FROM quote_history WHERE symbol = ? AND seq NOT IN
             (SELECT seq FROM quote_history WHERE symbol = ? ORDER BY seq DESC LIMIT ?)",
        )
        .bind(&quote.symbol)
        .bind(&quote.symbol)
        .bind(QUOTE_HISTORY_CAP)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM quotes WHERE symbol = ? AND expires_at > ?")
                .bind(symbol)
                .bind(Utc::now().timestamp())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(payload,)| serde_json::from_str(&payload).ok()))
    }

    pub async fn get_quotes(&self) -> Result<Vec<Quote>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT payload FROM quotes WHERE expires_at > ? ORDER BY symbol ASC")
                .bind(Utc::now().timestamp())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(payload,)| serde_json::from_str(&payload).ok())
            .collect())
    }

    pub async fn get_quote_history(&self, symbol: &str, limit: i64) -> Result<Vec<Quote>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT payload FROM quote_history WHERE symbol = ? ORDER BY seq DESC LIMIT ?",
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(payload,)| serde_json::from_str(&payload).ok())
            .collect())
    }

    // --- Latencies ---

    pub async fn put_latency(&self, sample: &LatencySample, ttl_secs: i64) -> Result<()> {
        let payload = serde_json::to_string(sample)?;
        sqlx::query(
            "INSERT INTO latencies (venue, payload, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(venue) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at",
        )
        .bind(sample.venue.to_string())
        .bind(&payload)
        .bind(Utc::now().timestamp() + ttl_secs)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_latencies(&self) -> Result<Vec<LatencySample>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT payload FROM latencies WHERE expires_at > ? ORDER BY venue ASC")
                .bind(Utc::now().timestamp())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(payload,)| serde_json::from_str(&payload).ok())
            .collect())
    }

    // --- Opportunities ---

    pub async fn put_opportunity(&self, opportunity: &Opportunity, ttl_secs: i64) -> Result<()> {
        let payload = serde_json::to_string(opportunity)?;
        sqlx::query(
            "INSERT INTO opportunities (symbol, payload, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(symbol) DO UPDATE SET
                payload = excluded.payload,
                expires_at = excluded.expires_at",
        )
        .bind(&opportunity.symbol)
        .bind(&payload)
        .bind(Utc::now().timestamp() + ttl_secs)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_opportunities(&self) -> Result<Vec<Opportunity>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT payload FROM opportunities WHERE expires_at > ? ORDER BY symbol ASC",
        )
        .bind(Utc::now().timestamp())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(payload,)| serde_json::from_str(&payload).ok())
            .collect())
    }

    // --- Trades ---

    /// Append to the global executed-trade list, newest-first, trimmed to
    /// the retention cap.
    pub async fn push_trade(&self, trade: &Trade) -> Result<()> {
        let payload = serde_json::to_string(trade)?;
        sqlx::query("INSERT INTO trades (payload) VALUES (?)")
            .bind(&payload)
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "DELETE FROM trades WHERE seq NOT IN
             (SELECT seq FROM trades ORDER BY seq DESC LIMIT ?)",
        )
        .bind(TRADE_LIST_CAP)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_recent_trades(&self, limit: i64) -> Result<Vec<Trade>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT payload FROM trades ORDER BY seq DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(payload,)| serde_json::from_str(&payload).ok())
            .collect())
    }

    // --- Performance ---

    pub async fn put_performance(&self, snapshot: &PerformanceSnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO performance (id, total_pnl, trades_executed, success_rate, last_updated)
             VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                total_pnl = excluded.total_pnl,
                trades_executed = excluded.trades_executed,
                success_rate = excluded.success_rate,
                last_updated = excluded.last_updated",
        )
        .bind(snapshot.total_pnl)
        .bind(snapshot.trades_executed as i64)
        .bind(snapshot.success_rate)
        .bind(snapshot.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_performance(&self) -> Result<Option<PerformanceSnapshot>> {
        let row: Option<(f64, i64, f64, String)> = sqlx::query_as(
            "SELECT total_pnl, trades_executed, success_rate, last_updated FROM performance WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(total_pnl, trades_executed, success_rate, last_updated)| {
            PerformanceSnapshot {
                total_pnl,
                trades_executed: trades_executed.max(0) as u64,
                success_rate,
                last_updated: chrono::DateTime::parse_from_rfc3339(&last_updated)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            }
        }))
    }

    /// Sweep expired quote, latency, and opportunity records.
    pub async fn purge_expired(&self) -> Result<()> {
        let now = Utc::now().timestamp();
        for table in ["quotes", "latencies", "opportunities"] {
            sqlx::query(&format!("DELETE FROM {} WHERE expires_at <= ?", table))
                .bind(now)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TradeStatus, Venue};

    fn quote(symbol: &str, price: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change: "0.42".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn trade(symbol: &str, profit: f64) -> Trade {
        Trade {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            strategy: "NYSE -> BATS".to_string(),
            profit,
            timestamp: Utc::now(),
            status: TradeStatus::Success,
        }
    }

    #[tokio::test]
    async fn quotes_round_trip_and_expire() {
        let db = Database::in_memory().await.unwrap();

        db.put_quote(&quote("AAPL", 187.23), 300).await.unwrap();
        let stored = db.get_quote("AAPL").await.unwrap().unwrap();
        assert_eq!(stored.symbol, "AAPL");
        assert!((stored.price - 187.23).abs() < 1e-9);

        // Already-expired rows are invisible to readers.
        db.put_quote(&quote("MSFT", 410.0), -1).await.unwrap();
        assert!(db.get_quote("MSFT").await.unwrap().is_none());
        assert_eq!(db.get_quotes().await.unwrap().len(), 1);

        db.purge_expired().await.unwrap();
        let remaining: Vec<(String,)> = sqlx::query_as("SELECT symbol FROM quotes")
            .fetch_all(&db.pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec![("AAPL".to_string(),)]);
    }

    #[tokio::test]
    async fn quote_history_is_capped_per_symbol() {
        let db = Database::in_memory().await.unwrap();
        for i in 0..105 {
            db.put_quote(&quote("AAPL", 100.0 + i as f64), 300).await.unwrap();
        }
        db.put_quote(&quote("MSFT", 400.0), 300).await.unwrap();

        let history = db.get_quote_history("AAPL", 200).await.unwrap();
        assert_eq!(history.len(), 100);
        // Newest first.
        assert!((history[0].price - 204.0).abs() < 1e-9);
        assert_eq!(db.get_quote_history("MSFT", 200).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trade_list_keeps_the_newest_hundred() {
        let db = Database::in_memory().await.unwrap();
        for i in 0..101 {
            db.push_trade(&trade(&format!("SYM{}", i), 0.1)).await.unwrap();
        }

        let trades = db.get_recent_trades(200).await.unwrap();
        assert_eq!(trades.len(), 100);
        assert_eq!(trades[0].symbol, "SYM100");
        assert_eq!(trades[99].symbol, "SYM1");
    }

    #[tokio::test]
    async fn performance_row_upserts() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.get_performance().await.unwrap().is_none());

        let first = PerformanceSnapshot {
            total_pnl: 1.25,
            trades_executed: 10,
            success_rate: 0.9,
            last_updated: Utc::now(),
        };
        db.put_performance(&first).await.unwrap();

        let second = PerformanceSnapshot {
            total_pnl: 1.40,
            trades_executed: 11,
            success_rate: 10.0 / 11.0,
            last_updated: Utc::now(),
        };
        db.put_performance(&second).await.unwrap();

        let stored = db.get_performance().await.unwrap().unwrap();
        assert!((stored.total_pnl - 1.40).abs() < 1e-9);
        assert_eq!(stored.trades_executed, 11);
    }

    #[tokio::test]
    async fn opportunities_and_latencies_round_trip() {
        let db = Database::in_memory().await.unwrap();

        let opp = Opportunity {
            symbol: "AAPL".to_string(),
            buy_venue: Venue::Nyse,
            sell_venue: Venue::Nasdaq,
            buy_price: 99.90,
            sell_price: 100.05,
            profit_per_share: 0.15,
            profit_bps: 15.015,
            timestamp: Utc::now(),
        };
        db.put_opportunity(&opp, 300).await.unwrap();
        let stored = db.get_opportunities().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].buy_venue, Venue::Nyse);
        assert_eq!(stored[0].sell_venue, Venue::Nasdaq);

        let sample = LatencySample {
            venue: Venue::Bats,
            latency_ms: 12.5,
            timestamp: Utc::now(),
        };
        db.put_latency(&sample, 300).await.unwrap();
        let latencies = db.get_latencies().await.unwrap();
        assert_eq!(latencies.len(), 1);
        assert!((latencies[0].latency_ms - 12.5).abs() < 1e-9);
    }
}
