//! Signal engine parameters.

use serde::{Deserialize, Serialize};

/// What the `volume` field of a snapshot measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSemantics {
    /// Running day total, as level-one quote feeds report it.
    #[default]
    RunningTotal,
    /// Volume traded since the previous observation.
    PeriodDelta,
}

/// Thresholds for the two trigger rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Minimum relative shrink of the sell-one queue, in (0, 1).
    pub sell_one_drop_ratio: f64,
    /// Minimum absolute shrink of the sell-one queue.
    pub min_sell_one_drop: u64,
    /// Window buy volume must exceed `cumulative_before * buy_flow_ratio`.
    pub buy_flow_ratio: f64,
    pub min_buy_volume: u64,
    /// Consecutive settled windows a predicate must hold before it fires (1..=20).
    pub confirm_windows: u32,
    pub volume_semantics: VolumeSemantics,
}

pub const MAX_CONFIRM_WINDOWS: u32 = 20;

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sell_one_drop_ratio: 0.5,
            min_sell_one_drop: 0,
            buy_flow_ratio: 1.0,
            min_buy_volume: 0,
            confirm_windows: 1,
            volume_semantics: VolumeSemantics::RunningTotal,
        }
    }
}

impl SignalConfig {
    pub fn with_sell_one_drop_ratio(mut self, ratio: f64) -> Self {
        self.sell_one_drop_ratio = ratio;
        self
    }

    pub fn with_confirm_windows(mut self, windows: u32) -> Self {
        self.confirm_windows = windows;
        self
    }

    pub fn with_volume_semantics(mut self, semantics: VolumeSemantics) -> Self {
        self.volume_semantics = semantics;
        self
    }

    /// Check parameter ranges. Returns the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sell_one_drop_ratio > 0.0 && self.sell_one_drop_ratio < 1.0) {
            return Err(format!(
                "sell_one_drop_ratio must be in (0, 1), got {}",
                self.sell_one_drop_ratio
            ));
        }
        if !self.buy_flow_ratio.is_finite() || self.buy_flow_ratio < 0.0 {
            return Err(format!(
                "buy_flow_ratio must be a finite value >= 0, got {}",
                self.buy_flow_ratio
            ));
        }
        if !(1..=MAX_CONFIRM_WINDOWS).contains(&self.confirm_windows) {
            return Err(format!(
                "confirm_windows must be in 1..={MAX_CONFIRM_WINDOWS}, got {}",
                self.confirm_windows
            ));
        }
        Ok(())
    }

    /// Streak length a rule needs; never below one.
    pub(crate) fn required_streak(&self) -> u32 {
        self.confirm_windows.max(1)
    }
}
