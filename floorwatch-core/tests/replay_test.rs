//! Integration tests for the replay engine.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use floorwatch_core::domain::{Confidence, DataQuality, MinuteBar};
use floorwatch_core::replay::{replay, ReplayEngine, ReplayOutcome, ReplayWindow};
use floorwatch_core::ReplayError;

// ── Helpers ──────────────────────────────────────────────────────────

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

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

fn traded_bar(h: u32, m: u32, volume: u64) -> MinuteBar {
    MinuteBar {
        close: 9.2,
        high: 9.4,
        ..floor_bar(h, m, volume)
    }
}

// ── Accumulation vs window ───────────────────────────────────────────

#[test]
fn morning_volume_counts_toward_cumulative() {
    let bars = vec![floor_bar(9, 35, 1000), floor_bar(13, 10, 1500)];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();

    assert_eq!(d.outcome, ReplayOutcome::Triggered);
    let t = d.trigger.unwrap();
    assert_eq!(t.trigger_time, at(13, 10));
    assert_eq!(t.current_buy_volume, 1500);
    assert_eq!(t.cumulative_buy_volume_before, 1000);
    assert_eq!(d.counters.samples, 2);
    assert_eq!(d.counters.samples_in_window, 1);
    assert_eq!(d.counters.samples_one_word_in_window, 1);
}

#[test]
fn only_one_word_bars_accumulate() {
    // 5000 traded off the floor must not raise the bar.
    let bars = vec![
        floor_bar(9, 35, 1000),
        traded_bar(10, 0, 5000),
        floor_bar(13, 10, 1500),
    ];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert!(d.triggered());
    assert_eq!(d.trigger.unwrap().cumulative_buy_volume_before, 1000);
}

#[test]
fn first_trigger_stops_the_scan() {
    let bars = vec![
        floor_bar(9, 35, 100),
        floor_bar(13, 1, 200),
        floor_bar(13, 2, 10_000),
    ];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert_eq!(d.trigger.unwrap().trigger_time, at(13, 1));
    assert_eq!(d.counters.samples, 2);
    assert_eq!(d.cumulative_buy_volume, 100);
}

#[test]
fn later_window_bar_tests_against_earlier_window_volume() {
    let bars = vec![
        floor_bar(9, 35, 100),
        floor_bar(13, 1, 50),
        floor_bar(13, 2, 151),
    ];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    let t = d.trigger.unwrap();
    assert_eq!(t.trigger_time, at(13, 2));
    assert_eq!(t.cumulative_buy_volume_before, 150);
}

// ── Window edges ─────────────────────────────────────────────────────

#[test]
fn bar_at_window_end_is_eligible() {
    let bars = vec![floor_bar(9, 35, 1000), floor_bar(15, 0, 1500)];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert!(d.triggered());
}

#[test]
fn bar_after_window_end_is_not() {
    let bars = vec![floor_bar(9, 35, 1000), floor_bar(15, 1, 1500)];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert_eq!(d.outcome, ReplayOutcome::NoDataInWindow);
    assert!(d.trigger.is_none());
}

// ── Outcomes ─────────────────────────────────────────────────────────

#[test]
fn empty_input_is_no_data() {
    let d = ReplayEngine::default().replay(&[]).unwrap();
    assert_eq!(d.outcome, ReplayOutcome::NoDataInWindow);
    assert!(d.symbol.is_empty());
    assert!(d.date.is_none());
    assert_eq!(d.data_quality, DataQuality::MinuteProxy);
    assert_eq!(d.confidence, Confidence::Low);
}

#[test]
fn never_on_the_floor_is_its_own_outcome() {
    let bars = vec![traded_bar(9, 35, 1000), traded_bar(13, 10, 5000)];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert_eq!(d.outcome, ReplayOutcome::NoOneWordLimitDown);
    assert_eq!(d.counters.one_word_samples, 0);
}

#[test]
fn floor_without_breakout_is_threshold_not_met() {
    let bars = vec![floor_bar(9, 35, 1000), floor_bar(13, 10, 1000)];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert_eq!(d.outcome, ReplayOutcome::ThresholdNotMet);
    assert_eq!(d.cumulative_buy_volume, 2000);
}

#[test]
fn floor_that_opened_before_the_window_is_no_one_word() {
    // On the floor all morning, traded away before 13:00: nothing to test.
    let bars = vec![
        floor_bar(9, 35, 1000),
        traded_bar(13, 10, 5000),
        traded_bar(14, 0, 5000),
    ];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert_eq!(d.outcome, ReplayOutcome::NoOneWordLimitDown);
    assert_eq!(d.counters.samples_in_window, 2);
    assert_eq!(d.counters.samples_one_word_in_window, 0);
}

#[test]
fn no_window_data_takes_precedence_over_no_one_word() {
    let bars = vec![traded_bar(9, 35, 1000)];
    let d = replay(&bars, hm(13, 0), hm(15, 0)).unwrap();
    assert_eq!(d.outcome, ReplayOutcome::NoDataInWindow);
}

#[test]
fn window_before_the_open_is_rejected() {
    let bars = vec![floor_bar(9, 20, 100), floor_bar(9, 25, 500)];
    let err = replay(&bars, hm(9, 15), hm(9, 25)).unwrap_err();
    assert!(matches!(err, ReplayError::WindowBeforeOpen { .. }));

    // Moving the open back makes the same bars count and trigger.
    let window = ReplayWindow::with_open(hm(9, 15), hm(9, 25), hm(9, 15)).unwrap();
    let d = ReplayEngine::new(window).replay(&bars).unwrap();
    assert_eq!(d.counters.samples_in_window, 2);
    assert_eq!(d.outcome, ReplayOutcome::Triggered);
    assert_eq!(d.trigger.unwrap().cumulative_buy_volume_before, 100);
}

// ── Determinism ──────────────────────────────────────────────────────

#[test]
fn replay_is_deterministic() {
    let bars: Vec<MinuteBar> = (0..120)
        .map(|i| {
            let (h, m) = (9 + (30 + i) / 60, (30 + i) % 60);
            floor_bar(h, m, 100 + (i as u64 * 37) % 400)
        })
        .chain((0..120).map(|i| floor_bar(13 + i / 60, i % 60, 50 + (i as u64 * 91) % 900)))
        .collect();
    let engine = ReplayEngine::new(ReplayWindow::new(hm(13, 0), hm(14, 30)).unwrap());
    let a = engine.replay(&bars).unwrap();
    let b = engine.replay(&bars).unwrap();
    assert_eq!(a, b);
}
