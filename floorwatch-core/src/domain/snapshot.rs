//! ValidatedSnapshot: one symbol at one observation instant.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::limit::{has_opened, is_one_word_limit_down};

/// Provenance of the order-flow fields in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    /// Level-one quote feed: sell-one size is the real best-ask queue.
    TickLevel,
    /// Minute bars: order-flow fields are derived from traded volume.
    MinuteProxy,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TickLevel => "tick_level",
            Self::MinuteProxy => "minute_proxy",
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Self::TickLevel => Confidence::High,
            Self::MinuteProxy => Confidence::Low,
        }
    }
}

/// How much downstream consumers should trust a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

/// Validated quote snapshot for a single symbol.
///
/// Produced by the fetch-and-validate layer: prices are parsed, "no order"
/// quote sizes are already cleaned to zero. What `volume` means (running day
/// total or per-poll delta) is fixed by `SignalConfig::volume_semantics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedSnapshot {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub ts: NaiveDateTime,
    pub current_price: f64,
    pub high_price: f64,
    pub limit_down_price: f64,
    /// Sell-one (best ask) queue size.
    pub ask_v1: u64,
    pub volume: u64,
    pub data_quality: DataQuality,
}

impl ValidatedSnapshot {
    /// Current price and session high both equal the limit-down price.
    pub fn is_one_word_limit_down(&self) -> bool {
        is_one_word_limit_down(self.current_price, self.high_price, self.limit_down_price)
    }

    /// The session high has traded above the limit-down price.
    pub fn has_opened(&self) -> bool {
        has_opened(self.high_price, self.limit_down_price)
    }

    /// Returns a description of the first broken field, if any.
    pub fn sanity_error(&self) -> Option<String> {
        if self.symbol.trim().is_empty() {
            return Some("empty symbol".into());
        }
        for (field, value) in [
            ("current_price", self.current_price),
            ("high_price", self.high_price),
            ("limit_down_price", self.limit_down_price),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Some(format!("{field} must be a positive finite price, got {value}"));
            }
        }
        None
    }
}
