//! One-word limit-down predicate shared by the live and replay engines.
//!
//! Prices arrive as f64 quoted in 0.01 ticks. Equality is checked within
//! `PRICE_EPSILON`, well below one tick, so feed-side float noise never opens
//! or closes the gate on its own.

/// Tolerance for price equality (far below the 0.01 tick).
pub const PRICE_EPSILON: f64 = 1e-6;

/// Price equality within [`PRICE_EPSILON`].
pub fn prices_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= PRICE_EPSILON
}

/// True when the last price and the session high both sit on the limit-down price.
///
/// This is the gating precondition for every rule in both engines: a symbol that
/// has never traded away from its floor.
pub fn is_one_word_limit_down(price: f64, high: f64, limit_down: f64) -> bool {
    prices_equal(price, limit_down) && prices_equal(high, limit_down)
}

/// True once the session high has traded above the limit-down price.
///
/// Once observed the symbol is no longer a one-word candidate for the day.
pub fn has_opened(high: f64, limit_down: f64) -> bool {
    high - limit_down > PRICE_EPSILON
}

/// Derive a limit-down price from the previous close, rounded to the 0.01 tick.
///
/// `ratio` is the fraction of the previous close the floor sits at
/// (0.9 for a 10% band, 0.95 for ST names).
pub fn limit_down_from_pre_close(pre_close: f64, ratio: f64) -> f64 {
    (pre_close * ratio * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_word_requires_price_and_high_on_floor() {
        assert!(is_one_word_limit_down(9.0, 9.0, 9.0));
        assert!(!is_one_word_limit_down(9.01, 9.01, 9.0));
        assert!(!is_one_word_limit_down(9.0, 9.05, 9.0));
    }

    #[test]
    fn float_noise_is_tolerated() {
        assert!(is_one_word_limit_down(9.000_000_1, 8.999_999_9, 9.0));
        assert!(!has_opened(9.000_000_1, 9.0));
    }

    #[test]
    fn opened_when_high_above_floor() {
        assert!(has_opened(9.01, 9.0));
        assert!(!has_opened(9.0, 9.0));
    }

    #[test]
    fn pre_close_fallback_rounds_to_tick() {
        assert_eq!(limit_down_from_pre_close(10.0, 0.9), 9.0);
        assert_eq!(limit_down_from_pre_close(12.34, 0.9), 11.11);
        assert_eq!(limit_down_from_pre_close(7.77, 0.95), 7.38);
    }
}
