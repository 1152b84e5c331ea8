use std::cmp::Ordering;

use crate::domain::Opportunity;

/// Order a batch of candidates for publication: best edge first, symbol
/// lexical order on equal edges. Candidates at or below `min_profit_bps` are
/// dropped here as a second gate before anything is published. The input is
/// left untouched.
pub fn rank(opportunities: &[Opportunity], min_profit_bps: f64) -> Vec<Opportunity> {
    let mut ranked: Vec<Opportunity> = opportunities
        .iter()
        .filter(|o| o.profit_bps > min_profit_bps)
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        b.profit_bps
            .partial_cmp(&a.profit_bps)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Venue;
    use chrono::Utc;

    fn opp(symbol: &str, profit_bps: f64) -> Opportunity {
        Opportunity {
            symbol: symbol.to_string(),
            buy_venue: Venue::Nyse,
            sell_venue: Venue::Nasdaq,
            buy_price: 100.0,
            sell_price: 100.0 + profit_bps / 100.0,
            profit_per_share: profit_bps / 100.0,
            profit_bps,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn orders_by_descending_edge_then_symbol() {
        let ranked = rank(
            &[opp("TSLA", 8.0), opp("AAPL", 12.0), opp("NVDA", 8.0)],
            1.0,
        );
        let symbols: Vec<&str> = ranked.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "NVDA", "TSLA"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let once = rank(&[opp("TSLA", 8.0), opp("AAPL", 12.0), opp("NVDA", 8.0)], 1.0);
        let twice = rank(&once, 1.0);
        let a: Vec<&str> = once.iter().map(|o| o.symbol.as_str()).collect();
        let b: Vec<&str> = twice.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn filters_sub_threshold_candidates() {
        let ranked = rank(&[opp("AAPL", 12.0), opp("MSFT", 3.0)], 5.0);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].symbol, "AAPL");
    }

    #[test]
    fn input_is_not_mutated() {
        let input = vec![opp("TSLA", 8.0), opp("AAPL", 12.0)];
        let _ = rank(&input, 1.0);
        assert_eq!(input[0].symbol, "TSLA");
        assert_eq!(input[1].symbol, "AAPL");
    }
}
