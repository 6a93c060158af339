//! Trigger predicates. Pure functions of two adjacent windows and the thresholds;
//! gating, one-shot bookkeeping and merging live in the engine.

use crate::domain::{BuyFlowMetrics, SellOneMetrics};

use super::config::SignalConfig;

/// Rule A: the window's buy volume breaks out over everything traded before it.
///
/// `current` is the buy volume of the window being settled, `before` the
/// cumulative volume up to the previous window.
pub fn buy_flow_breakout(
    current: u64,
    before: u64,
    config: &SignalConfig,
) -> Option<BuyFlowMetrics> {
    if before == 0 {
        return None;
    }
    let fires = current as f64 > before as f64 * config.buy_flow_ratio
        && current >= config.min_buy_volume;
    fires.then(|| BuyFlowMetrics {
        current_buy_volume: current,
        cumulative_buy_volume_before: before,
        ratio: current as f64 / before as f64,
    })
}

/// Rule B: the sell-one queue shrinks sharply between adjacent windows.
pub fn sell_one_drop(
    previous_ask: u64,
    current_ask: u64,
    config: &SignalConfig,
) -> Option<SellOneMetrics> {
    let delta = previous_ask as i128 - current_ask as i128;
    let ratio = delta as f64 / previous_ask.max(1) as f64;
    let fires = ratio >= config.sell_one_drop_ratio && delta >= config.min_sell_one_drop as i128;
    fires.then_some(SellOneMetrics {
        previous_ask_v1: previous_ask,
        current_ask_v1: current_ask,
        drop_ratio: ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_flow_needs_history() {
        let cfg = SignalConfig::default();
        assert!(buy_flow_breakout(500, 0, &cfg).is_none());
    }

    #[test]
    fn buy_flow_is_strictly_greater() {
        let cfg = SignalConfig::default();
        assert!(buy_flow_breakout(150, 150, &cfg).is_none());
        let m = buy_flow_breakout(250, 150, &cfg).unwrap();
        assert_eq!(m.current_buy_volume, 250);
        assert_eq!(m.cumulative_buy_volume_before, 150);
        assert!((m.ratio - 250.0 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn buy_flow_respects_ratio_and_floor() {
        let cfg = SignalConfig {
            buy_flow_ratio: 2.0,
            min_buy_volume: 400,
            ..SignalConfig::default()
        };
        assert!(buy_flow_breakout(301, 150, &cfg).is_none());
        assert!(buy_flow_breakout(450, 150, &cfg).is_some());
        assert!(buy_flow_breakout(399, 100, &cfg).is_none());
    }

    #[test]
    fn sell_one_threshold_is_inclusive() {
        let cfg = SignalConfig::default();
        assert!(sell_one_drop(1000, 500, &cfg).is_some());
        assert!(sell_one_drop(1000, 501, &cfg).is_none());
    }

    #[test]
    fn growing_queue_never_fires() {
        let cfg = SignalConfig::default().with_sell_one_drop_ratio(0.01);
        assert!(sell_one_drop(100, 300, &cfg).is_none());
    }

    #[test]
    fn empty_previous_queue_does_not_divide_by_zero() {
        let cfg = SignalConfig::default().with_sell_one_drop_ratio(0.1);
        let m = sell_one_drop(0, 0, &cfg);
        assert!(m.is_none());
    }

    #[test]
    fn sell_one_absolute_floor() {
        let cfg = SignalConfig {
            min_sell_one_drop: 600,
            ..SignalConfig::default()
        };
        assert!(sell_one_drop(1000, 500, &cfg).is_none());
        let m = sell_one_drop(1000, 300, &cfg).unwrap();
        assert!((m.drop_ratio - 0.7).abs() < 1e-12);
    }
}
