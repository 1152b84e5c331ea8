use chrono::Utc;
use eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::adapters::database::Database;
use crate::domain::Quote;

const BASE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
}

/// Alpha Vantage GLOBAL_QUOTE client. A missing or malformed payload is
/// absence of input, not an error: the pipeline downstream simply sees no
/// quote for the symbol.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self { client, api_key })
    }

    pub async fn global_quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let response = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Alpha Vantage returned {} for {}", response.status(), symbol);
            return Ok(None);
        }

        let body: GlobalQuoteResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => return Ok(None),
        };

        let Some(raw) = body.global_quote else {
            return Ok(None);
        };
        let Some(price) = raw.price.as_deref().and_then(|p| p.parse::<f64>().ok()) else {
            return Ok(None);
        };
        if price <= 0.0 {
            return Ok(None);
        }

        Ok(Some(Quote {
            symbol: symbol.to_string(),
            price,
            change: raw.change.unwrap_or_else(|| "0".to_string()),
            timestamp: Utc::now(),
        }))
    }
}

/// Walks the symbol list on a fixed cadence, storing each quote with a TTL.
/// The inter-call delay keeps us under the provider's rate limit.
pub struct QuoteCollector {
    client: AlphaVantageClient,
    db: Database,
    symbols: Vec<String>,
    quote_ttl_secs: i64,
    fetch_delay: std::time::Duration,
    cycle_interval: std::time::Duration,
}

impl QuoteCollector {
    pub fn new(
        client: AlphaVantageClient,
        db: Database,
        symbols: Vec<String>,
        quote_ttl_secs: i64,
        fetch_delay_ms: u64,
        collect_interval_secs: u64,
    ) -> Self {
        Self {
            client,
            db,
            symbols,
            quote_ttl_secs,
            fetch_delay: std::time::Duration::from_millis(fetch_delay_ms),
            cycle_interval: std::time::Duration::from_secs(collect_interval_secs),
        }
    }

    pub async fn run(self) -> Result<()> {
        info!("Quote collector started for {} symbols", self.symbols.len());

        loop {
            let mut collected = 0usize;
            for symbol in &self.symbols {
                match self.client.global_quote(symbol).await {
                    Ok(Some(quote)) => {
                        if let Err(e) = self.db.put_quote(&quote, self.quote_ttl_secs).await {
                            warn!("{}: failed to store quote: {:?}", symbol, e);
                        } else {
                            collected += 1;
                            info!("{}: ${:.2}", symbol, quote.price);
                        }
                    }
                    Ok(None) => warn!("{}: no quote in response", symbol),
                    Err(e) => warn!("{}: quote fetch failed: {:?}", symbol, e),
                }
                tokio::time::sleep(self.fetch_delay).await;
            }

            info!(
                "Quote cycle complete: {}/{} symbols",
                collected,
                self.symbols.len()
            );
            tokio::time::sleep(self.cycle_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_global_quote_payload() {
        let body = r#"{
            "Global Quote": {
                "01. symbol": "AAPL",
                "05. price": "187.2300",
                "09. change": "1.2400"
            }
        }"#;
        let parsed: GlobalQuoteResponse = serde_json::from_str(body).unwrap();
        let quote = parsed.global_quote.unwrap();
        assert_eq!(quote.price.as_deref(), Some("187.2300"));
        assert_eq!(quote.change.as_deref(), Some("1.2400"));
    }

    #[test]
    fn empty_payload_means_no_quote() {
        // Rate-limited responses come back as a note with no quote block.
        let body = r#"{"Note": "Thank you for using Alpha Vantage!"}"#;
        let parsed: GlobalQuoteResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.global_quote.is_none());
    }
}
