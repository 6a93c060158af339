//! Per-symbol state of the live engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AlertEvent, AlertOrigin, RuleId, RuleSet, ValidatedSnapshot,
};

use super::config::{SignalConfig, VolumeSemantics};
use super::rules::{buy_flow_breakout, sell_one_drop};

/// Carried features of a settled window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFeatures {
    pub ts: NaiveDateTime,
    pub ask_v1: u64,
    pub volume: u64,
    /// Volume traded up to and including this window.
    pub cumulative_volume: u64,
}

impl WindowFeatures {
    /// Features of the first window of a sequence. `carried` is the volume
    /// already traded before the sequence began (always 0 for running totals).
    pub fn seed(snapshot: &ValidatedSnapshot, carried: u64) -> Self {
        Self {
            ts: snapshot.ts,
            ask_v1: snapshot.ask_v1,
            volume: snapshot.volume,
            cumulative_volume: carried.saturating_add(snapshot.volume),
        }
    }

    /// Features of the window after `self`, plus that window's buy volume.
    pub fn advance(&self, next: &ValidatedSnapshot, semantics: VolumeSemantics) -> (Self, u64) {
        let (window_volume, cumulative) = match semantics {
            VolumeSemantics::RunningTotal => {
                (next.volume.saturating_sub(self.volume), next.volume)
            }
            VolumeSemantics::PeriodDelta => {
                (next.volume, self.cumulative_volume.saturating_add(next.volume))
            }
        };
        let features = Self {
            ts: next.ts,
            ask_v1: next.ask_v1,
            volume: next.volume,
            cumulative_volume: cumulative,
        };
        (features, window_volume)
    }
}

/// Consecutive settled windows on which a rule's predicate held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStreaks {
    pub buy_flow: u32,
    pub sell_one: u32,
}

impl RuleStreaks {
    fn slot(&mut self, rule: RuleId) -> &mut u32 {
        match rule {
            RuleId::BuyFlowBreakout => &mut self.buy_flow,
            RuleId::SellOneDrop => &mut self.sell_one,
        }
    }

    /// Extends or resets the streak and reports whether it reached `required`.
    fn record(&mut self, rule: RuleId, hit: bool, required: u32) -> bool {
        let slot = self.slot(rule);
        *slot = if hit { slot.saturating_add(1) } else { 0 };
        hit && *slot >= required
    }

    pub fn any(&self) -> bool {
        self.buy_flow > 0 || self.sell_one > 0
    }
}

/// Everything the engine remembers about one symbol during a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolState {
    pub gating_open: bool,
    /// Terminal for the session.
    pub removed: bool,
    pub previous_window_features: Option<WindowFeatures>,
    pub triggered_rules: RuleSet,
    /// Latest eligible observation whose window has not been settled.
    pub last_snapshot: Option<ValidatedSnapshot>,
    pub streaks: RuleStreaks,
    pub last_seen_ts: Option<NaiveDateTime>,
    /// Period-delta volume from discarded window sequences.
    #[serde(default)]
    pub carried_volume: u64,
}

impl SymbolState {
    /// Both rules have fired; the symbol can never alert again today.
    pub fn is_silenced(&self) -> bool {
        self.triggered_rules.is_full()
    }

    pub fn has_pending(&self) -> bool {
        self.last_snapshot.is_some()
    }

    /// Close the gate and forget the window sequence.
    ///
    /// Under `PeriodDelta` the volume traded so far, `closing` included, is
    /// kept so the next sequence starts from the day's cumulative volume.
    pub(crate) fn reset_window(&mut self, closing: &ValidatedSnapshot, semantics: VolumeSemantics) {
        if semantics == VolumeSemantics::PeriodDelta {
            let settled = self
                .previous_window_features
                .map_or(self.carried_volume, |f| f.cumulative_volume);
            let pending = self.last_snapshot.as_ref().map_or(0, |s| s.volume);
            self.carried_volume = settled
                .saturating_add(pending)
                .saturating_add(closing.volume);
        }
        self.clear_window();
    }

    fn clear_window(&mut self) {
        self.gating_open = false;
        self.previous_window_features = None;
        self.last_snapshot = None;
        self.streaks = RuleStreaks::default();
    }

    pub(crate) fn mark_removed(&mut self) {
        self.clear_window();
        self.removed = true;
    }

    /// Settle the pending window against the previous one.
    ///
    /// Consumes the pending snapshot and rolls `previous_window_features`
    /// forward whether or not anything fired. With no previous window the
    /// pending one only seeds the features.
    pub(crate) fn settle(
        &mut self,
        config: &SignalConfig,
        trigger_ts: NaiveDateTime,
        origin: AlertOrigin,
        pool_name: Option<&str>,
    ) -> Option<AlertEvent> {
        let pending = self.last_snapshot.take()?;
        let Some(previous) = self.previous_window_features else {
            self.previous_window_features =
                Some(WindowFeatures::seed(&pending, self.carried_volume));
            return None;
        };

        let (current, window_volume) = previous.advance(&pending, config.volume_semantics);
        self.previous_window_features = Some(current);

        if !self.gating_open || self.is_silenced() {
            return None;
        }

        let required = config.required_streak();
        let mut fired = RuleSet::empty();

        let mut buy_flow = None;
        if !self.triggered_rules.contains(RuleId::BuyFlowBreakout) {
            let hit = buy_flow_breakout(window_volume, previous.cumulative_volume, config);
            if self.streaks.record(RuleId::BuyFlowBreakout, hit.is_some(), required) {
                fired.insert(RuleId::BuyFlowBreakout);
                buy_flow = hit;
            }
        }

        let mut sell_one = None;
        if !self.triggered_rules.contains(RuleId::SellOneDrop) {
            let hit = sell_one_drop(previous.ask_v1, pending.ask_v1, config);
            if self.streaks.record(RuleId::SellOneDrop, hit.is_some(), required) {
                fired.insert(RuleId::SellOneDrop);
                sell_one = hit;
            }
        }

        if fired.is_empty() {
            return None;
        }
        self.triggered_rules = self.triggered_rules.union(fired);

        Some(AlertEvent {
            name: pending
                .name
                .clone()
                .or_else(|| pool_name.map(str::to_string)),
            symbol: pending.symbol,
            trigger_ts,
            prev_window_ts: previous.ts,
            curr_window_ts: pending.ts,
            rules: fired,
            buy_flow,
            sell_one,
            data_quality: pending.data_quality,
            confidence: pending.data_quality.confidence(),
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataQuality;
    use chrono::NaiveDate;

    fn snap(minute: u32, ask: u64, volume: u64) -> ValidatedSnapshot {
        ValidatedSnapshot {
            symbol: "600000".into(),
            name: None,
            ts: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(13, minute, 0)
                .unwrap(),
            current_price: 9.0,
            high_price: 9.0,
            limit_down_price: 9.0,
            ask_v1: ask,
            volume,
            data_quality: DataQuality::TickLevel,
        }
    }

    #[test]
    fn running_total_window_volume_is_the_difference() {
        let f = WindowFeatures::seed(&snap(0, 1000, 100), 0);
        let (next, window) = f.advance(&snap(1, 900, 150), VolumeSemantics::RunningTotal);
        assert_eq!(window, 50);
        assert_eq!(next.cumulative_volume, 150);
    }

    #[test]
    fn running_total_never_goes_negative() {
        let f = WindowFeatures::seed(&snap(0, 1000, 300), 0);
        let (_, window) = f.advance(&snap(1, 900, 200), VolumeSemantics::RunningTotal);
        assert_eq!(window, 0);
    }

    #[test]
    fn period_delta_accumulates() {
        let f = WindowFeatures::seed(&snap(0, 1000, 100), 0);
        let (next, window) = f.advance(&snap(1, 900, 40), VolumeSemantics::PeriodDelta);
        assert_eq!(window, 40);
        assert_eq!(next.cumulative_volume, 140);
    }

    #[test]
    fn settle_without_previous_only_seeds() {
        let mut state = SymbolState {
            gating_open: true,
            last_snapshot: Some(snap(0, 1000, 100)),
            ..SymbolState::default()
        };
        let cfg = SignalConfig::default();
        let ev = state.settle(&cfg, snap(1, 0, 0).ts, AlertOrigin::Live, None);
        assert!(ev.is_none());
        assert!(!state.has_pending());
        assert_eq!(state.previous_window_features.unwrap().cumulative_volume, 100);
    }

    #[test]
    fn period_delta_volume_survives_a_gate_reset() {
        let cfg = SignalConfig::default().with_volume_semantics(VolumeSemantics::PeriodDelta);
        let mut state = SymbolState {
            gating_open: true,
            last_snapshot: Some(snap(0, 1000, 100)),
            ..SymbolState::default()
        };
        state.settle(&cfg, snap(1, 0, 0).ts, AlertOrigin::Live, None);
        state.last_snapshot = Some(snap(1, 1000, 50));
        state.settle(&cfg, snap(2, 0, 0).ts, AlertOrigin::Live, None);
        assert_eq!(state.previous_window_features.unwrap().cumulative_volume, 150);

        // Pending 20 plus the closing 30 are traded volume too.
        state.last_snapshot = Some(snap(2, 1000, 20));
        state.reset_window(&snap(3, 1000, 30), VolumeSemantics::PeriodDelta);
        assert!(!state.gating_open);
        assert_eq!(state.carried_volume, 200);

        state.gating_open = true;
        state.last_snapshot = Some(snap(4, 1000, 10));
        state.settle(&cfg, snap(5, 0, 0).ts, AlertOrigin::Live, None);
        assert_eq!(state.previous_window_features.unwrap().cumulative_volume, 210);
    }

    #[test]
    fn running_total_reset_carries_nothing() {
        let mut state = SymbolState {
            previous_window_features: Some(WindowFeatures::seed(&snap(0, 1000, 400), 0)),
            ..SymbolState::default()
        };
        state.reset_window(&snap(1, 1000, 450), VolumeSemantics::RunningTotal);
        assert_eq!(state.carried_volume, 0);
        assert!(state.previous_window_features.is_none());
    }

    #[test]
    fn streak_resets_on_miss() {
        let mut streaks = RuleStreaks::default();
        assert!(!streaks.record(RuleId::SellOneDrop, true, 2));
        assert!(!streaks.record(RuleId::SellOneDrop, false, 2));
        assert_eq!(streaks.sell_one, 0);
        assert!(!streaks.record(RuleId::SellOneDrop, true, 2));
        assert!(streaks.record(RuleId::SellOneDrop, true, 2));
    }
}
