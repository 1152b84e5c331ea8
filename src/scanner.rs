use eyre::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::adapters::database::Database;
use crate::config::DetectionConfig;
use crate::domain::Opportunity;
use crate::strategy::{detector, ranker, synthesizer};

/// Periodic detection cycle: reference quote -> synthetic venue prices ->
/// best buy/sell pair -> ranked publication. Each symbol is independent, so
/// a cycle abandoned mid-scan leaves no partial state behind.
pub struct Scanner {
    db: Database,
    detection: DetectionConfig,
    symbols: Vec<String>,
    opportunity_ttl_secs: i64,
    opportunity_tx: mpsc::Sender<Opportunity>,
}

impl Scanner {
    pub fn new(
        db: Database,
        detection: DetectionConfig,
        symbols: Vec<String>,
        opportunity_ttl_secs: i64,
        opportunity_tx: mpsc::Sender<Opportunity>,
    ) -> Self {
        Self {
            db,
            detection,
            symbols,
            opportunity_ttl_secs,
            opportunity_tx,
        }
    }

    pub async fn run(self) -> Result<()> {
        info!(
            "Scanner started: {} symbols, {} venues, floor {} bps",
            self.symbols.len(),
            self.detection.venues.len(),
            self.detection.min_profit_bps
        );

        let mut rng = StdRng::from_entropy();
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            self.detection.scan_interval_secs,
        ));

        loop {
            interval.tick().await;
            if let Err(e) = self.scan_once(&mut rng).await {
                error!("Scan cycle failed: {:?}", e);
            }
        }
    }

    /// One full pass over the symbol list. Publishes every candidate that
    /// survives ranking, then hands it to the executor; the channel send
    /// transfers ownership, which is what marks the opportunity consumed.
    pub async fn scan_once(&self, rng: &mut impl Rng) -> Result<usize> {
        self.db.purge_expired().await?;

        let mut candidates = Vec::new();
        for symbol in &self.symbols {
            let Some(quote) = self.db.get_quote(symbol).await? else {
                continue;
            };

            let venue_prices = match synthesizer::synthesize(
                quote.price,
                &self.detection.venues,
                self.detection.tick_size,
                rng,
            ) {
                Ok(prices) => prices,
                Err(e) => {
                    warn!("{}: skipping detection: {}", symbol, e);
                    continue;
                }
            };

            if let Some(opportunity) =
                detector::detect(symbol, &venue_prices, self.detection.min_profit_bps)
            {
                candidates.push(opportunity);
            }
        }

        let ranked = ranker::rank(&candidates, self.detection.min_profit_bps);
        let mut published = 0usize;

        for opportunity in ranked {
            info!(
                "{}: buy {} @ {:.2} -> sell {} @ {:.2} ({:.1} bps)",
                opportunity.symbol,
                opportunity.buy_venue,
                opportunity.buy_price,
                opportunity.sell_venue,
                opportunity.sell_price,
                opportunity.profit_bps
            );
            self.db
                .put_opportunity(&opportunity, self.opportunity_ttl_secs)
                .await?;
            if self.opportunity_tx.send(opportunity).await.is_err() {
                warn!("Execution channel closed, halting publication");
                break;
            }
            published += 1;
        }

        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VenueProfile;
    use crate::domain::{Quote, Venue};
    use chrono::Utc;
    use rand_chacha::ChaCha8Rng;

    fn detection(min_profit_bps: f64) -> DetectionConfig {
        DetectionConfig {
            // Non-overlapping bands force a spread on every draw.
            venues: vec![
                VenueProfile { venue: Venue::Nyse, low: 0.990, high: 0.994 },
                VenueProfile { venue: Venue::Nasdaq, low: 1.006, high: 1.010 },
                VenueProfile { venue: Venue::Bats, low: 0.998, high: 1.002 },
            ],
            min_profit_bps,
            tick_size: 0.01,
            scan_interval_secs: 30,
        }
    }

    async fn seed_quote(db: &Database, symbol: &str, price: f64) {
        let quote = Quote {
            symbol: symbol.to_string(),
            price,
            change: "0".to_string(),
            timestamp: Utc::now(),
        };
        db.put_quote(&quote, 300).await.unwrap();
    }

    #[tokio::test]
    async fn publishes_and_dispatches_detected_opportunities() {
        let db = Database::in_memory().await.unwrap();
        seed_quote(&db, "AAPL", 187.23).await;
        seed_quote(&db, "MSFT", 410.10).await;

        let (tx, mut rx) = mpsc::channel(16);
        let scanner = Scanner::new(
            db.clone(),
            detection(5.0),
            vec!["AAPL".to_string(), "MSFT".to_string()],
            300,
            tx,
        );

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let published = scanner.scan_once(&mut rng).await.unwrap();
        assert_eq!(published, 2);

        // Store carries the records for the dashboard.
        assert_eq!(db.get_opportunities().await.unwrap().len(), 2);

        // Channel carries them exactly once, ranked best-first.
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.profit_bps >= second.profit_bps);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn symbols_without_quotes_are_skipped() {
        let db = Database::in_memory().await.unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let scanner = Scanner::new(
            db.clone(),
            detection(5.0),
            vec!["AAPL".to_string()],
            300,
            tx,
        );

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let published = scanner.scan_once(&mut rng).await.unwrap();
        assert_eq!(published, 0);
        assert!(rx.try_recv().is_err());
        assert!(db.get_opportunities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn an_unreachable_floor_publishes_nothing() {
        let db = Database::in_memory().await.unwrap();
        seed_quote(&db, "AAPL", 187.23).await;

        let (tx, mut rx) = mpsc::channel(16);
        let scanner = Scanner::new(
            db.clone(),
            detection(10_000.0),
            vec!["AAPL".to_string()],
            300,
            tx,
        );

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(scanner.scan_once(&mut rng).await.unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }
}
