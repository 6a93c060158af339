//! Runtime counters for a live session.
//!
//! Timestamps are data time (the snapshot clock), never wall-clock, so a
//! recorded session produces the same status every time it is replayed.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub session_date: Option<NaiveDate>,
    pub live_running: bool,
    pub rounds: usize,
    pub snapshots: usize,
    /// Snapshots outside the monitoring window, dropped before the engine.
    pub skipped_outside_window: usize,
    /// Snapshots the engine refused.
    pub rejected: usize,
    pub alerts_delivered: usize,
    /// Delivered alerts produced by the end-of-session flush.
    pub flushed_alerts: usize,
    pub delivery_failures: usize,
    pub stopped_early: bool,
    pub last_poll_at: Option<NaiveDateTime>,
    pub last_alert_at: Option<NaiveDateTime>,
    pub last_error: Option<String>,
}

impl RuntimeStatus {
    pub fn mark_started(&mut self, date: NaiveDate) {
        *self = Self {
            session_date: Some(date),
            live_running: true,
            ..Self::default()
        };
    }

    pub fn mark_finished(&mut self) {
        self.live_running = false;
    }

    /// One polling round; `at` is the latest snapshot time in it.
    pub fn mark_poll(&mut self, at: Option<NaiveDateTime>, snapshots: usize) {
        self.rounds += 1;
        self.snapshots += snapshots;
        if at.is_some() {
            self.last_poll_at = at;
        }
    }

    pub fn mark_rejected(&mut self, error: &str) {
        self.rejected += 1;
        self.last_error = Some(error.to_string());
    }

    pub fn mark_alert(&mut self, at: NaiveDateTime, flushed: bool) {
        self.alerts_delivered += 1;
        if flushed {
            self.flushed_alerts += 1;
        }
        self.last_alert_at = Some(at);
    }

    pub fn mark_delivery_failure(&mut self, error: &str) {
        self.delivery_failures += 1;
        self.last_error = Some(error.to_string());
    }

    /// Single-line summary for logs.
    pub fn summary_line(&self) -> String {
        format!(
            "rounds={} snapshots={} skipped={} rejected={} alerts={} (flushed {}) delivery_failures={}{}",
            self.rounds,
            self.snapshots,
            self.skipped_outside_window,
            self.rejected,
            self.alerts_delivered,
            self.flushed_alerts,
            self.delivery_failures,
            if self.stopped_early { " stopped_early" } else { "" },
        )
    }
}
