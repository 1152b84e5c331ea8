use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trading venues, in fixed priority order. When two venues quote the same
/// price, the lower-ordered venue wins the tie so detection stays
/// reproducible for a given input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Venue {
    #[serde(rename = "NYSE")]
    Nyse,
    #[serde(rename = "NASDAQ")]
    Nasdaq,
    #[serde(rename = "BATS")]
    Bats,
}

impl Venue {
    pub const ALL: [Venue; 3] = [Venue::Nyse, Venue::Nasdaq, Venue::Bats];
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Venue::Nyse => write!(f, "NYSE"),
            Venue::Nasdaq => write!(f, "NASDAQ"),
            Venue::Bats => write!(f, "BATS"),
        }
    }
}

impl std::str::FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NYSE" => Ok(Venue::Nyse),
            "NASDAQ" => Ok(Venue::Nasdaq),
            "BATS" => Ok(Venue::Bats),
            other => Err(format!("unknown venue: {}", other)),
        }
    }
}

/// Reference quote for a symbol, produced by the market data collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: String,
    pub timestamp: DateTime<Utc>,
}

/// A cross-venue price discrepancy worth publishing: buy at the cheapest
/// venue, sell at the richest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    pub buy_venue: Venue,
    pub sell_venue: Venue,
    pub buy_price: f64,
    pub sell_price: f64,
    pub profit_per_share: f64,
    pub profit_bps: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Success => write!(f, "SUCCESS"),
            TradeStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One simulated execution attempt. Immutable once created; a failed attempt
/// is final for that opportunity instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub strategy: String,
    pub profit: f64,
    pub timestamp: DateTime<Utc>,
    pub status: TradeStatus,
}

/// Running totals over the all-time trade history. `success_rate` counts
/// failed attempts in the denominator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSnapshot {
    pub total_pnl: f64,
    pub trades_executed: u64,
    pub success_rate: f64,
    pub last_updated: DateTime<Utc>,
}

/// Round-trip latency to a venue endpoint. Display-only: never part of the
/// economic decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencySample {
    pub venue: Venue,
    pub latency_ms: f64,
    pub timestamp: DateTime<Utc>,
}

/// Rejected inputs. Raised before any state mutation; the caller recovers by
/// supplying corrected input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("reference price must be positive, got {0}")]
    NonPositivePrice(f64),
    #[error("venue set is empty")]
    EmptyVenueSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_priority_follows_declaration_order() {
        assert!(Venue::Nyse < Venue::Nasdaq);
        assert!(Venue::Nasdaq < Venue::Bats);
    }

    #[test]
    fn venue_round_trips_through_display_and_parse() {
        for venue in Venue::ALL {
            let parsed: Venue = venue.to_string().parse().unwrap();
            assert_eq!(parsed, venue);
        }
        assert!("CBOE".parse::<Venue>().is_err());
    }

    #[test]
    fn trade_status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&TradeStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&TradeStatus::Failed).unwrap(),
            "\"FAILED\""
        );
    }
}
