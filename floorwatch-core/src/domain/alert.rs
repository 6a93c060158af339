//! AlertEvent: the immutable result of a settled window that fired.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::rule::{RuleId, RuleSet};
use super::snapshot::{Confidence, DataQuality};

/// Figures behind a buy-flow breakout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyFlowMetrics {
    pub current_buy_volume: u64,
    pub cumulative_buy_volume_before: u64,
    /// `current / before`.
    pub ratio: f64,
}

/// Figures behind a sell-one drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellOneMetrics {
    pub previous_ask_v1: u64,
    pub current_ask_v1: u64,
    pub drop_ratio: f64,
}

/// Whether the window was settled by a later observation or by the session flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertOrigin {
    Live,
    Flush,
}

/// One alert for one symbol. Rules that fired on the same settlement share an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub symbol: String,
    pub name: Option<String>,
    /// Timestamp of the observation that settled the window
    /// (equal to `curr_window_ts` for flushed events).
    pub trigger_ts: NaiveDateTime,
    pub prev_window_ts: NaiveDateTime,
    pub curr_window_ts: NaiveDateTime,
    pub rules: RuleSet,
    pub buy_flow: Option<BuyFlowMetrics>,
    pub sell_one: Option<SellOneMetrics>,
    pub data_quality: DataQuality,
    pub confidence: Confidence,
    pub origin: AlertOrigin,
}

impl AlertEvent {
    pub fn reason(&self) -> String {
        self.rules.reason()
    }

    pub fn fired(&self, rule: RuleId) -> bool {
        self.rules.contains(rule)
    }

    /// Display label: name when known, otherwise the symbol.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}
