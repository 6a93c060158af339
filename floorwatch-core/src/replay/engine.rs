//! ReplayEngine: deterministic single pass over one symbol's minute bars.
//!
//! Bars from the session open onward accumulate one-word volume for the whole
//! day; only bars inside the window are tested, each against the volume
//! accumulated before it. The first breakout ends the scan.

use chrono::NaiveTime;
use tracing::debug;

use crate::domain::{DataQuality, MinuteBar, RuleId};
use crate::error::ReplayError;

use super::accumulator::BacktestAccumulator;
use super::decision::{ReplayCounters, ReplayDecision, ReplayOutcome};
use super::window::ReplayWindow;

/// Stateless between runs; one engine can replay many series concurrently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayEngine {
    window: ReplayWindow,
}

impl ReplayEngine {
    pub fn new(window: ReplayWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &ReplayWindow {
        &self.window
    }

    /// Replay one symbol's bars for one trading day.
    ///
    /// The whole series is validated before the scan starts.
    pub fn replay(&self, bars: &[MinuteBar]) -> Result<ReplayDecision, ReplayError> {
        validate_series(bars)?;

        let window = &self.window;
        let mut acc = BacktestAccumulator::new();
        let mut counters = ReplayCounters::default();

        for bar in bars {
            counters.samples += 1;
            let t = bar.ts.time();
            if t < window.session_open() {
                continue;
            }
            // validate_series guarantees the volume is present
            let volume = bar.volume.unwrap_or_default();
            let one_word = bar.is_one_word_limit_down();
            if one_word {
                counters.one_word_samples += 1;
            }

            if window.contains(t) {
                counters.samples_in_window += 1;
                if one_word {
                    counters.samples_one_word_in_window += 1;
                    if acc.try_trigger(bar.ts, volume) {
                        debug!(
                            symbol = %bar.symbol,
                            ts = %bar.ts,
                            volume,
                            before = acc.cumulative_buy_volume(),
                            "replay trigger"
                        );
                        break;
                    }
                }
            }

            if one_word {
                acc.accumulate(volume);
            }
        }

        let outcome = if acc.trigger().is_some() {
            ReplayOutcome::Triggered
        } else if counters.samples_in_window == 0 {
            ReplayOutcome::NoDataInWindow
        } else if counters.samples_one_word_in_window == 0 {
            ReplayOutcome::NoOneWordLimitDown
        } else {
            ReplayOutcome::ThresholdNotMet
        };

        let quality = DataQuality::MinuteProxy;
        Ok(ReplayDecision {
            symbol: bars.first().map(|b| b.symbol.clone()).unwrap_or_default(),
            date: bars.first().map(|b| b.trade_date()),
            window_start: window.start(),
            window_end: window.end(),
            rule: RuleId::BuyFlowBreakout,
            outcome,
            cumulative_buy_volume: acc.cumulative_buy_volume(),
            trigger: acc.into_trigger(),
            counters,
            data_quality: quality,
            confidence: quality.confidence(),
        })
    }
}

/// Replay with the given window and the default session open.
pub fn replay(
    bars: &[MinuteBar],
    window_start: NaiveTime,
    window_end: NaiveTime,
) -> Result<ReplayDecision, ReplayError> {
    ReplayEngine::new(ReplayWindow::new(window_start, window_end)?).replay(bars)
}

fn validate_series(bars: &[MinuteBar]) -> Result<(), ReplayError> {
    let Some(first) = bars.first() else {
        return Ok(());
    };
    let expected_date = first.trade_date();

    for (index, bar) in bars.iter().enumerate() {
        if bar.symbol != first.symbol || bar.trade_date() != expected_date {
            return Err(ReplayError::MixedSeries {
                index,
                symbol: bar.symbol.clone(),
                date: bar.trade_date(),
                expected_symbol: first.symbol.clone(),
                expected_date,
            });
        }
        if index > 0 {
            let previous = bars[index - 1].ts;
            if bar.ts <= previous {
                return Err(ReplayError::OutOfOrder {
                    index,
                    ts: bar.ts,
                    previous,
                });
            }
        }
        let Some(limit) = bar.limit_down_price else {
            return Err(ReplayError::MissingField {
                index,
                field: "limit_down_price",
            });
        };
        if bar.volume.is_none() {
            return Err(ReplayError::MissingField {
                index,
                field: "volume",
            });
        }
        for (field, value) in [
            ("close", bar.close),
            ("high", bar.high),
            ("limit_down_price", limit),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ReplayError::InvalidBar {
                    index,
                    reason: format!("{field} must be a positive finite price, got {value}"),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::window::hm;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn floor_bar(h: u32, m: u32, volume: u64) -> MinuteBar {
        MinuteBar {
            symbol: "600000".into(),
            ts: at(h, m),
            close: 9.0,
            high: 9.0,
            limit_down_price: Some(9.0),
            volume: Some(volume),
        }
    }

    #[test]
    fn auction_bars_do_not_accumulate() {
        let bars = vec![floor_bar(9, 25, 50_000), floor_bar(13, 0, 10)];
        let d = ReplayEngine::default().replay(&bars).unwrap();
        assert_eq!(d.outcome, ReplayOutcome::ThresholdNotMet);
        assert_eq!(d.counters.samples, 2);
        assert_eq!(d.counters.one_word_samples, 1);
        assert_eq!(d.cumulative_buy_volume, 10);
    }

    #[test]
    fn custom_session_open() {
        let bars = vec![floor_bar(9, 25, 100), floor_bar(13, 0, 150)];
        let window = ReplayWindow::default().with_session_open(hm(9, 15)).unwrap();
        let d = ReplayEngine::new(window).replay(&bars).unwrap();
        assert!(d.triggered());
    }

    #[test]
    fn missing_fields_are_hard_errors() {
        let mut bar = floor_bar(13, 0, 10);
        bar.volume = None;
        let err = ReplayEngine::default().replay(&[floor_bar(9, 31, 1), bar]).unwrap_err();
        assert_eq!(
            err,
            ReplayError::MissingField {
                index: 1,
                field: "volume"
            }
        );

        let mut bar = floor_bar(13, 0, 10);
        bar.limit_down_price = None;
        let err = ReplayEngine::default().replay(&[bar]).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::MissingField {
                field: "limit_down_price",
                ..
            }
        ));
    }

    #[test]
    fn series_checks() {
        let err = ReplayEngine::default()
            .replay(&[floor_bar(13, 1, 1), floor_bar(13, 1, 1)])
            .unwrap_err();
        assert!(matches!(err, ReplayError::OutOfOrder { index: 1, .. }));

        let mut other = floor_bar(13, 2, 1);
        other.symbol = "000001".into();
        let err = ReplayEngine::default()
            .replay(&[floor_bar(13, 1, 1), other])
            .unwrap_err();
        assert!(matches!(err, ReplayError::MixedSeries { index: 1, .. }));

        let mut nan = floor_bar(13, 2, 1);
        nan.close = f64::NAN;
        let err = ReplayEngine::default().replay(&[nan]).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidBar { index: 0, .. }));
    }

    #[test]
    fn floor_only_outside_the_window_is_no_one_word() {
        let mut opened = floor_bar(13, 10, 5000);
        opened.close = 9.2;
        opened.high = 9.4;
        let mut later = opened.clone();
        later.ts = at(14, 0);
        let bars = vec![floor_bar(9, 35, 1000), opened, later];

        let d = ReplayEngine::default().replay(&bars).unwrap();
        assert_eq!(d.outcome, ReplayOutcome::NoOneWordLimitDown);
        assert_eq!(d.counters.samples_in_window, 2);
        assert_eq!(d.counters.samples_one_word_in_window, 0);
        assert_eq!(d.counters.one_word_samples, 1);
    }

    #[test]
    fn free_function_rejects_window_before_open() {
        let bars = vec![floor_bar(9, 20, 100), floor_bar(9, 25, 500)];
        let err = replay(&bars, hm(9, 15), hm(9, 25)).unwrap_err();
        assert!(matches!(err, ReplayError::WindowBeforeOpen { .. }));
    }

    #[test]
    fn free_function_rejects_inverted_window() {
        let err = replay(&[], hm(15, 0), hm(13, 0)).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidWindow { .. }));
    }
}
