use chrono::Utc;
use eyre::Result;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::adapters::database::Database;
use crate::domain::{LatencySample, Venue};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Samples round-trip latency to each venue endpoint as TCP connect time.
/// Informational only: the detection and execution cycles never read these.
pub struct LatencyMonitor {
    db: Database,
    endpoints: Vec<(Venue, String)>,
    latency_ttl_secs: i64,
    probe_interval: Duration,
}

impl LatencyMonitor {
    pub fn new(
        db: Database,
        endpoints: Vec<(Venue, String)>,
        latency_ttl_secs: i64,
        probe_interval_secs: u64,
    ) -> Self {
        Self {
            db,
            endpoints,
            latency_ttl_secs,
            probe_interval: Duration::from_secs(probe_interval_secs),
        }
    }

    pub async fn run(self) -> Result<()> {
        info!("Latency monitor started for {} venues", self.endpoints.len());
        let mut interval = tokio::time::interval(self.probe_interval);

        loop {
            interval.tick().await;
            for (venue, endpoint) in &self.endpoints {
                match measure(endpoint).await {
                    Some(latency_ms) => {
                        let sample = LatencySample {
                            venue: *venue,
                            latency_ms,
                            timestamp: Utc::now(),
                        };
                        if let Err(e) = self.db.put_latency(&sample, self.latency_ttl_secs).await {
                            warn!("{}: failed to store latency: {:?}", venue, e);
                        } else {
                            info!("{}: {:.1}ms", venue, latency_ms);
                        }
                    }
                    None => warn!("{}: latency probe failed", venue),
                }
            }
        }
    }
}

async fn measure(endpoint: &str) -> Option<f64> {
    let start = Instant::now();
    match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(endpoint)).await {
        Ok(Ok(_)) => Some(start.elapsed().as_secs_f64() * 1000.0),
        _ => None,
    }
}
