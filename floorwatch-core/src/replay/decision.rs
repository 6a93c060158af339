//! ReplayDecision: the structured result of one replay run.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{Confidence, DataQuality, RuleId};

use super::accumulator::TriggerDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcome {
    Triggered,
    /// No bar inside the window (includes empty input).
    NoDataInWindow,
    /// Bars in the window, but none of them on a one-word limit-down.
    NoOneWordLimitDown,
    ThresholdNotMet,
}

impl ReplayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::NoDataInWindow => "no_data_in_window",
            Self::NoOneWordLimitDown => "no_one_word_limit_down",
            Self::ThresholdNotMet => "threshold_not_met",
        }
    }
}

/// Bar counts collected during the scan (up to the trigger, if any).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCounters {
    pub samples: usize,
    pub samples_in_window: usize,
    pub samples_one_word_in_window: usize,
    pub one_word_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDecision {
    /// Empty when the input had no bars.
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub rule: RuleId,
    pub outcome: ReplayOutcome,
    pub trigger: Option<TriggerDetail>,
    /// Cumulative one-word volume when the scan stopped.
    pub cumulative_buy_volume: u64,
    pub counters: ReplayCounters,
    pub data_quality: DataQuality,
    pub confidence: Confidence,
}

impl ReplayDecision {
    pub fn triggered(&self) -> bool {
        self.outcome == ReplayOutcome::Triggered
    }
}
