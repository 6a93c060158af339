//! MinuteBar: the unit of replay input.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::limit::is_one_word_limit_down;

/// One-minute bar for a single symbol.
///
/// `limit_down_price` and `volume` stay optional here so that a missing
/// upstream value reaches the replay engine as a hard input error instead of a
/// silent default. Filling them in (e.g. from the previous close) is the data
/// mapping layer's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    pub symbol: String,
    pub ts: NaiveDateTime,
    pub close: f64,
    pub high: f64,
    #[serde(default)]
    pub limit_down_price: Option<f64>,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl MinuteBar {
    pub fn trade_date(&self) -> NaiveDate {
        self.ts.date()
    }

    /// Close and high both on the limit-down price.
    ///
    /// A bar without a limit price is never one-word.
    pub fn is_one_word_limit_down(&self) -> bool {
        match self.limit_down_price {
            Some(limit) => is_one_word_limit_down(self.close, self.high, limit),
            None => false,
        }
    }
}
