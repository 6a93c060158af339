//! SignalEngine: live per-symbol state machine over validated snapshots.
//!
//! Each eligible observation opens a window. The window is settled (its rules
//! evaluated) when the symbol's next eligible observation arrives, or by
//! [`SignalEngine::flush_pending`] at session end. Settling window *n* only
//! looks at observation *n* and the carried features of window *n-1*.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{AlertEvent, AlertOrigin, PoolStock, ValidatedSnapshot};
use crate::error::EngineError;

use super::config::SignalConfig;
use super::state::SymbolState;

/// Counts over the tracked symbols, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub tracked: usize,
    pub removed: usize,
    pub silenced: usize,
    /// Symbols with an unsettled window.
    pub pending: usize,
    /// Symbols with a rule part way through its confirmation streak.
    pub confirming: usize,
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: SignalConfig,
    session_date: Option<NaiveDate>,
    pool: BTreeMap<String, PoolStock>,
    states: BTreeMap<String, SymbolState>,
}

impl SignalEngine {
    /// Creates an engine with no session date and an empty pool.
    ///
    /// The configuration is taken as given; use [`SignalConfig::validate`]
    /// before handing over user input.
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            session_date: None,
            pool: BTreeMap::new(),
            states: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn session_date(&self) -> Option<NaiveDate> {
        self.session_date
    }

    /// Start a new trading day: all symbol state is dropped.
    pub fn begin_session(&mut self, date: NaiveDate) {
        debug!(%date, dropped = self.states.len(), "begin session");
        self.session_date = Some(date);
        self.states.clear();
    }

    /// Replace the monitoring pool. Symbol state is reset.
    pub fn register_pool(&mut self, stocks: impl IntoIterator<Item = PoolStock>) {
        self.pool = stocks
            .into_iter()
            .map(|s| (s.symbol.clone(), s))
            .collect();
        self.states.clear();
        debug!(pool = self.pool.len(), "pool registered");
    }

    /// Feed one snapshot; returns the alert produced by settling the
    /// symbol's previous window, if any rule fired.
    pub fn evaluate(
        &mut self,
        snapshot: ValidatedSnapshot,
    ) -> Result<Option<AlertEvent>, EngineError> {
        self.check(&snapshot)?;

        let pool_name = self.pool.get(&snapshot.symbol).map(|s| s.name.as_str());
        let state = self.states.entry(snapshot.symbol.clone()).or_default();
        state.last_seen_ts = Some(snapshot.ts);

        if state.removed {
            return Ok(None);
        }

        if snapshot.has_opened() {
            debug!(
                symbol = %snapshot.symbol,
                high = snapshot.high_price,
                limit_down = snapshot.limit_down_price,
                "limit-down opened, symbol removed for the session"
            );
            state.mark_removed();
            return Ok(None);
        }

        if !snapshot.is_one_word_limit_down() {
            if state.gating_open || state.has_pending() {
                debug!(symbol = %snapshot.symbol, ts = %snapshot.ts, "not one-word, gate closed");
            }
            state.reset_window(&snapshot, self.config.volume_semantics);
            return Ok(None);
        }

        state.gating_open = true;
        let event = state.settle(&self.config, snapshot.ts, AlertOrigin::Live, pool_name);
        state.last_snapshot = Some(snapshot);

        if let Some(ev) = &event {
            info!(
                symbol = %ev.symbol,
                reason = %ev.reason(),
                window = %ev.curr_window_ts,
                "alert"
            );
        }
        Ok(event)
    }

    /// Settle every pending window at session end.
    ///
    /// A second call without new input returns nothing. Events come back in
    /// symbol order with `origin = Flush`.
    pub fn flush_pending(&mut self) -> Vec<AlertEvent> {
        let mut events = Vec::new();
        for (symbol, state) in self.states.iter_mut() {
            if state.removed {
                continue;
            }
            let Some(ts) = state.last_snapshot.as_ref().map(|s| s.ts) else {
                continue;
            };
            let pool_name = self.pool.get(symbol).map(|s| s.name.as_str());
            if let Some(ev) = state.settle(&self.config, ts, AlertOrigin::Flush, pool_name) {
                info!(symbol = %ev.symbol, reason = %ev.reason(), "alert (flush)");
                events.push(ev);
            }
        }
        events
    }

    /// Flush, then drop all per-symbol state. Returns the flushed alerts.
    pub fn end_session(&mut self) -> Vec<AlertEvent> {
        let events = self.flush_pending();
        debug!(flushed = events.len(), tracked = self.states.len(), "end session");
        self.states.clear();
        events
    }

    /// Pool and tracked symbols that can still alert today, sorted.
    pub fn monitorable_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .pool
            .keys()
            .chain(self.states.keys())
            .filter(|sym| {
                self.states
                    .get(*sym)
                    .map_or(true, |st| !st.removed && !st.is_silenced())
            })
            .cloned()
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    pub fn summary(&self) -> EngineSummary {
        let mut summary = EngineSummary {
            tracked: self.states.len(),
            ..EngineSummary::default()
        };
        for state in self.states.values() {
            if state.removed {
                summary.removed += 1;
            }
            if state.is_silenced() {
                summary.silenced += 1;
            }
            if state.has_pending() {
                summary.pending += 1;
            }
            if state.streaks.any() {
                summary.confirming += 1;
            }
        }
        summary
    }

    pub fn state(&self, symbol: &str) -> Option<&SymbolState> {
        self.states.get(symbol)
    }

    /// Input checks. Nothing is mutated on failure.
    fn check(&self, snapshot: &ValidatedSnapshot) -> Result<(), EngineError> {
        if let Some(reason) = snapshot.sanity_error() {
            return Err(EngineError::InvalidSnapshot {
                symbol: snapshot.symbol.clone(),
                reason,
            });
        }
        if let Some(session) = self.session_date {
            let got = snapshot.ts.date();
            if got != session {
                return Err(EngineError::SessionMismatch {
                    symbol: snapshot.symbol.clone(),
                    got,
                    session,
                });
            }
        }
        if let Some(last_seen) = self
            .states
            .get(&snapshot.symbol)
            .and_then(|st| st.last_seen_ts)
        {
            if snapshot.ts < last_seen {
                return Err(EngineError::OutOfOrder {
                    symbol: snapshot.symbol.clone(),
                    ts: snapshot.ts,
                    last_seen,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataQuality;
    use chrono::NaiveDateTime;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(13, minute, 0)
            .unwrap()
    }

    fn floor_snap(minute: u32, ask: u64, volume: u64) -> ValidatedSnapshot {
        ValidatedSnapshot {
            symbol: "600000".into(),
            name: None,
            ts: ts(minute),
            current_price: 9.0,
            high_price: 9.0,
            limit_down_price: 9.0,
            ask_v1: ask,
            volume,
            data_quality: DataQuality::TickLevel,
        }
    }

    #[test]
    fn rejected_input_leaves_state_untouched() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.evaluate(floor_snap(5, 1000, 100)).unwrap();
        let before = engine.state("600000").cloned();

        let err = engine.evaluate(floor_snap(4, 1000, 100)).unwrap_err();
        assert!(matches!(err, EngineError::OutOfOrder { .. }));

        let mut bad = floor_snap(6, 1000, 100);
        bad.high_price = f64::INFINITY;
        assert!(matches!(
            engine.evaluate(bad).unwrap_err(),
            EngineError::InvalidSnapshot { .. }
        ));

        assert_eq!(engine.state("600000").cloned(), before);
    }

    #[test]
    fn session_date_is_enforced() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.begin_session(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        let err = engine.evaluate(floor_snap(0, 1000, 100)).unwrap_err();
        assert!(matches!(err, EngineError::SessionMismatch { .. }));
        assert!(engine.state("600000").is_none());
    }

    #[test]
    fn equal_timestamps_are_accepted() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.evaluate(floor_snap(0, 1000, 100)).unwrap();
        assert!(engine.evaluate(floor_snap(0, 1000, 100)).is_ok());
    }

    #[test]
    fn monitorable_merges_pool_and_tracked() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.register_pool(vec![
            PoolStock::new("000001", "Alpha"),
            PoolStock::new("600000", "Beta"),
        ]);
        let mut other = floor_snap(0, 1000, 100);
        other.symbol = "300001".into();
        engine.evaluate(other).unwrap();

        let mut opened = floor_snap(0, 1000, 100);
        opened.high_price = 9.2;
        engine.evaluate(opened).unwrap();

        assert_eq!(engine.monitorable_symbols(), vec!["000001", "300001"]);
        let summary = engine.summary();
        assert_eq!(summary.tracked, 2);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.pending, 1);
    }

    #[test]
    fn alert_takes_name_from_pool() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.register_pool(vec![PoolStock::new("600000", "Beta")]);
        engine.evaluate(floor_snap(0, 1000, 100)).unwrap();
        engine.evaluate(floor_snap(1, 1000, 150)).unwrap();
        engine.evaluate(floor_snap(2, 1000, 400)).unwrap();
        let ev = engine.evaluate(floor_snap(3, 1000, 420)).unwrap().unwrap();
        assert_eq!(ev.name.as_deref(), Some("Beta"));
        assert_eq!(ev.trigger_ts, ts(3));
        assert_eq!(ev.prev_window_ts, ts(1));
        assert_eq!(ev.curr_window_ts, ts(2));
    }

    #[test]
    fn end_session_clears_state() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.evaluate(floor_snap(0, 1000, 100)).unwrap();
        engine.evaluate(floor_snap(1, 1000, 150)).unwrap();
        engine.evaluate(floor_snap(2, 1000, 500)).unwrap();
        let flushed = engine.end_session();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].origin, AlertOrigin::Flush);
        assert_eq!(engine.summary().tracked, 0);
    }
}
