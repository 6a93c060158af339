//! Full-day cumulative buy volume and the single trigger of a replay run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDetail {
    pub trigger_time: NaiveDateTime,
    pub current_buy_volume: u64,
    pub cumulative_buy_volume_before: u64,
}

/// Owned by one replay run. `cumulative_buy_volume` never decreases and the
/// trigger is set at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacktestAccumulator {
    cumulative_buy_volume: u64,
    trigger: Option<TriggerDetail>,
}

impl BacktestAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cumulative_buy_volume(&self) -> u64 {
        self.cumulative_buy_volume
    }

    pub fn trigger(&self) -> Option<&TriggerDetail> {
        self.trigger.as_ref()
    }

    pub fn accumulate(&mut self, volume: u64) {
        self.cumulative_buy_volume = self.cumulative_buy_volume.saturating_add(volume);
    }

    /// Test `current` against everything accumulated so far. Records and
    /// returns true on the first breakout; later calls are no-ops.
    pub fn try_trigger(&mut self, ts: NaiveDateTime, current: u64) -> bool {
        if self.trigger.is_some() {
            return false;
        }
        let before = self.cumulative_buy_volume;
        if before > 0 && current > before {
            self.trigger = Some(TriggerDetail {
                trigger_time: ts,
                current_buy_volume: current,
                cumulative_buy_volume_before: before,
            });
            return true;
        }
        false
    }

    pub fn into_trigger(self) -> Option<TriggerDetail> {
        self.trigger
    }
}
