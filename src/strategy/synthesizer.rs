use std::collections::BTreeMap;

use rand::Rng;

use crate::config::VenueProfile;
use crate::domain::{InvalidInput, Venue};

/// Derive per-venue prices from a reference price. Each venue draws an
/// independent multiplicative offset from its configured bounds, rounded to
/// the instrument tick. Consumes RNG state and nothing else.
pub fn synthesize(
    reference_price: f64,
    profiles: &[VenueProfile],
    tick_size: f64,
    rng: &mut impl Rng,
) -> Result<BTreeMap<Venue, f64>, InvalidInput> {
    if !(reference_price > 0.0) {
        return Err(InvalidInput::NonPositivePrice(reference_price));
    }
    if profiles.is_empty() {
        return Err(InvalidInput::EmptyVenueSet);
    }

    let mut prices = BTreeMap::new();
    for profile in profiles {
        let multiplier = rng.gen_range(profile.low..=profile.high);
        prices.insert(
            profile.venue,
            round_to_tick(reference_price * multiplier, tick_size),
        );
    }

    Ok(prices)
}

fn round_to_tick(price: f64, tick_size: f64) -> f64 {
    if tick_size > 0.0 {
        (price / tick_size).round() * tick_size
    } else {
        price
    }
}
