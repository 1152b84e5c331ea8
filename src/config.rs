use eyre::Result;
use serde::Deserialize;

use crate::domain::Venue;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Alpha Vantage key for the quote collector. Detection and execution
    /// still run off previously stored quotes when absent.
    pub alpha_vantage_api_key: Option<String>,
    pub symbols: Vec<String>,
    pub db_path: String,
    pub dashboard_port: u16,
    pub quote_ttl_secs: i64,
    pub latency_ttl_secs: i64,
    pub fetch_delay_ms: u64,
    pub collect_interval_secs: u64,
    pub latency_probe_interval_secs: u64,
    pub venue_endpoints: Vec<(Venue, String)>,
    pub detection: DetectionConfig,
    pub execution: ExecutionConfig,
}

/// Per-venue bounds on the multiplicative offset applied to the reference
/// price. A venue quoting inside `low..=high` times the reference.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueProfile {
    pub venue: Venue,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    pub venues: Vec<VenueProfile>,
    pub min_profit_bps: f64,
    pub tick_size: f64,
    pub scan_interval_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            venues: default_venue_profiles(),
            min_profit_bps: 5.0,
            tick_size: 0.01,
            scan_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    pub success_probability: f64,
    pub slippage_min: f64,
    pub slippage_max: f64,
    pub history_cap: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            success_probability: 0.95,
            slippage_min: 0.001,
            slippage_max: 0.003,
            history_cap: 100,
        }
    }
}

fn default_venue_profiles() -> Vec<VenueProfile> {
    vec![
        VenueProfile { venue: Venue::Nyse, low: 0.9985, high: 1.0015 },
        VenueProfile { venue: Venue::Nasdaq, low: 0.9990, high: 1.0020 },
        VenueProfile { venue: Venue::Bats, low: 0.9980, high: 1.0010 },
    ]
}

fn default_symbols() -> Vec<String> {
    [
        "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "AMD", "CRM",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_venue_endpoints() -> Vec<(Venue, String)> {
    vec![
        (Venue::Nyse, "www.nyse.com:443".to_string()),
        (Venue::Nasdaq, "www.nasdaq.com:443".to_string()),
        (Venue::Bats, "www.cboe.com:443".to_string()),
    ]
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let alpha_vantage_api_key = std::env::var("ALPHA_VANTAGE_API_KEY").ok();
        let symbols = match std::env::var("SYMBOLS") {
            Ok(csv) => csv
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => default_symbols(),
        };
        let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "arb.db".to_string());
        let dashboard_port: u16 = std::env::var("DASHBOARD_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .unwrap_or(3001);

        let venues = match std::env::var("VENUES") {
            Ok(csv) => {
                let selected: Vec<Venue> = csv
                    .split(',')
                    .filter_map(|s| s.parse().ok())
                    .collect();
                default_venue_profiles()
                    .into_iter()
                    .filter(|p| selected.contains(&p.venue))
                    .collect()
            }
            Err(_) => default_venue_profiles(),
        };

        let detection = DetectionConfig {
            venues,
            min_profit_bps: env_f64("MIN_PROFIT_BPS", 5.0),
            tick_size: env_f64("TICK_SIZE", 0.01),
            scan_interval_secs: env_u64("SCAN_INTERVAL_SECS", 30),
        };

        let execution = ExecutionConfig {
            success_probability: env_f64("SUCCESS_PROBABILITY", 0.95),
            slippage_min: env_f64("SLIPPAGE_MIN", 0.001),
            slippage_max: env_f64("SLIPPAGE_MAX", 0.003),
            history_cap: env_u64("TRADE_HISTORY_CAP", 100) as usize,
        };

        Ok(Config {
            alpha_vantage_api_key,
            symbols,
            db_path,
            dashboard_port,
            quote_ttl_secs: env_u64("QUOTE_TTL_SECS", 1800) as i64,
            latency_ttl_secs: env_u64("LATENCY_TTL_SECS", 300) as i64,
            fetch_delay_ms: env_u64("FETCH_DELAY_MS", 1500),
            collect_interval_secs: env_u64("COLLECT_INTERVAL_SECS", 300),
            latency_probe_interval_secs: env_u64("LATENCY_PROBE_INTERVAL_SECS", 60),
            venue_endpoints: default_venue_endpoints(),
            detection,
            execution,
        })
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_detection_covers_all_venues() {
        let detection = DetectionConfig::default();
        assert_eq!(detection.venues.len(), Venue::ALL.len());
        for profile in &detection.venues {
            assert!(profile.low < profile.high);
            assert!(profile.low > 0.0);
        }
    }

    #[test]
    fn default_execution_is_mostly_successful() {
        let execution = ExecutionConfig::default();
        assert_eq!(execution.success_probability, 0.95);
        assert!(execution.slippage_min <= execution.slippage_max);
        assert_eq!(execution.history_cap, 100);
    }
}
