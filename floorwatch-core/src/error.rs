//! Error types for the two engines.
//!
//! No-signal outcomes are ordinary values (`Ok(None)`, `ReplayOutcome`); these
//! enums only cover input the engines refuse to interpret.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Rejected live snapshot. Engine state is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{symbol}: snapshot at {ts} is older than last seen {last_seen}")]
    OutOfOrder {
        symbol: String,
        ts: NaiveDateTime,
        last_seen: NaiveDateTime,
    },

    #[error("invalid snapshot for '{symbol}': {reason}")]
    InvalidSnapshot { symbol: String, reason: String },

    #[error("{symbol}: snapshot dated {got} does not belong to session {session}")]
    SessionMismatch {
        symbol: String,
        got: NaiveDate,
        session: NaiveDate,
    },
}

/// Rejected replay input. Nothing is defaulted inside the replay engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("bar {index} at {ts} is not after the previous bar at {previous}")]
    OutOfOrder {
        index: usize,
        ts: NaiveDateTime,
        previous: NaiveDateTime,
    },

    #[error("bar {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("bar {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("bar {index} ({symbol} {date}) does not match series {expected_symbol} {expected_date}")]
    MixedSeries {
        index: usize,
        symbol: String,
        date: NaiveDate,
        expected_symbol: String,
        expected_date: NaiveDate,
    },

    #[error("window start {start} is after window end {end}")]
    InvalidWindow { start: NaiveTime, end: NaiveTime },

    #[error("window start {start} is before the session open {session_open}")]
    WindowBeforeOpen {
        start: NaiveTime,
        session_open: NaiveTime,
    },
}
