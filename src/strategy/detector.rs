use std::collections::BTreeMap;

use chrono::Utc;

use crate::domain::{Opportunity, Venue};

/// Find the best cross-venue buy/sell pair for a symbol. Buy at the arg-min
/// price, sell at the arg-max. Ties go to the highest-priority venue (map
/// iteration order), so the result is deterministic for a given input.
///
/// Returns `None` when fewer than two venues are quoted, when the best pair
/// degenerates to a single venue, or when the edge does not clear
/// `min_profit_bps`. None of these are errors.
pub fn detect(
    symbol: &str,
    venue_prices: &BTreeMap<Venue, f64>,
    min_profit_bps: f64,
) -> Option<Opportunity> {
    let mut iter = venue_prices.iter();
    let (&first_venue, &first_price) = iter.next()?;

    let mut buy = (first_venue, first_price);
    let mut sell = (first_venue, first_price);
    for (&venue, &price) in iter {
        // Strict comparisons keep the first (highest-priority) venue on ties.
        if price < buy.1 {
            buy = (venue, price);
        }
        if price > sell.1 {
            sell = (venue, price);
        }
    }

    if buy.0 == sell.0 || buy.1 <= 0.0 {
        return None;
    }

    let profit_per_share = sell.1 - buy.1;
    let profit_bps = profit_per_share / buy.1 * 10_000.0;
    if profit_bps <= min_profit_bps {
        return None;
    }

    Some(Opportunity {
        symbol: symbol.to_string(),
        buy_venue: buy.0,
        sell_venue: sell.0,
        buy_price: buy.1,
        sell_price: sell.1,
        profit_per_share,
        profit_bps,
        timestamp: Utc::now(),
    })
}
