//! Live session driver.
//!
//! Pulls polling rounds from a [`SnapshotSource`], filters them to the
//! monitoring window, feeds the [`SignalEngine`] and hands alerts to an
//! [`AlertSink`]. Rejected snapshots and failed deliveries are logged and
//! counted; neither stops the session.

use std::collections::VecDeque;

use chrono::NaiveDate;
use floorwatch_core::domain::{AlertEvent, AlertOrigin, ValidatedSnapshot};
use floorwatch_core::signal::SignalEngine;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::report::format_alert;
use crate::status::RuntimeStatus;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("snapshot source failed: {0}")]
    Source(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("alert delivery via {sink} failed: {reason}")]
    Failed { sink: String, reason: String },
}

/// Produces one polling round per call; `None` when the feed is exhausted.
pub trait SnapshotSource {
    fn next_round(&mut self) -> Result<Option<Vec<ValidatedSnapshot>>, SessionError>;
}

/// Receives alerts for delivery.
pub trait AlertSink {
    fn deliver(&mut self, event: &AlertEvent) -> Result<(), DeliveryError>;
}

pub struct LiveSession<S: SnapshotSource, K: AlertSink> {
    engine: SignalEngine,
    source: S,
    sink: K,
    window: SessionConfig,
    status: RuntimeStatus,
}

impl<S: SnapshotSource, K: AlertSink> LiveSession<S, K> {
    pub fn new(engine: SignalEngine, source: S, sink: K, window: SessionConfig) -> Self {
        Self {
            engine,
            source,
            sink,
            window,
            status: RuntimeStatus::default(),
        }
    }

    pub fn status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn into_parts(self) -> (SignalEngine, S, K, RuntimeStatus) {
        (self.engine, self.source, self.sink, self.status)
    }

    /// Run one trading day to completion and return every alert produced
    /// (delivered or not), flushed alerts last.
    pub fn run(&mut self, date: NaiveDate) -> Result<Vec<AlertEvent>, SessionError> {
        self.engine.begin_session(date);
        self.status.mark_started(date);
        info!(%date, pool = self.engine.monitorable_symbols().len(), "live session started");

        let mut alerts = Vec::new();
        while let Some(round) = self.source.next_round()? {
            alerts.extend(self.process_round(round));

            if self.engine.summary().tracked > 0 && self.engine.monitorable_symbols().is_empty() {
                info!("no monitorable symbols left; stopping early");
                self.status.stopped_early = true;
                break;
            }
        }

        for event in self.engine.end_session() {
            self.dispatch(&event);
            alerts.push(event);
        }

        self.status.mark_finished();
        info!(summary = %self.status.summary_line(), "live session finished");
        Ok(alerts)
    }

    /// Feed one polling round; returns the alerts it produced.
    pub fn process_round(&mut self, round: Vec<ValidatedSnapshot>) -> Vec<AlertEvent> {
        let latest = round.iter().map(|s| s.ts).max();
        self.status.mark_poll(latest, round.len());

        let mut alerts = Vec::new();
        for snapshot in round {
            if !self.window.contains(snapshot.ts.time()) {
                self.status.skipped_outside_window += 1;
                continue;
            }
            match self.engine.evaluate(snapshot) {
                Ok(Some(event)) => {
                    self.dispatch(&event);
                    alerts.push(event);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "snapshot rejected");
                    self.status.mark_rejected(&e.to_string());
                }
            }
        }
        debug!(round = self.status.rounds, alerts = alerts.len(), "round processed");
        alerts
    }

    fn dispatch(&mut self, event: &AlertEvent) {
        match self.sink.deliver(event) {
            Ok(()) => self
                .status
                .mark_alert(event.trigger_ts, event.origin == AlertOrigin::Flush),
            Err(e) => {
                warn!(symbol = %event.symbol, error = %e, "alert delivery failed");
                self.status.mark_delivery_failure(&e.to_string());
            }
        }
    }
}

/// Replays recorded snapshots, one round per distinct timestamp.
#[derive(Debug, Clone, Default)]
pub struct RecordedFeed {
    rounds: VecDeque<Vec<ValidatedSnapshot>>,
}

impl RecordedFeed {
    pub fn new(mut snapshots: Vec<ValidatedSnapshot>) -> Self {
        snapshots.sort_by_key(|s| s.ts);
        let mut rounds: VecDeque<Vec<ValidatedSnapshot>> = VecDeque::new();
        for snap in snapshots {
            match rounds.back_mut() {
                Some(round) if round.first().map(|s| s.ts) == Some(snap.ts) => round.push(snap),
                _ => rounds.push_back(vec![snap]),
            }
        }
        Self { rounds }
    }

    pub fn remaining_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Trading date of the first recorded snapshot.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rounds
            .front()
            .and_then(|r| r.first())
            .map(|s| s.ts.date())
    }
}

impl SnapshotSource for RecordedFeed {
    fn next_round(&mut self) -> Result<Option<Vec<ValidatedSnapshot>>, SessionError> {
        Ok(self.rounds.pop_front())
    }
}

/// Keeps every delivered alert in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub events: Vec<AlertEvent>,
}

impl AlertSink for CollectingSink {
    fn deliver(&mut self, event: &AlertEvent) -> Result<(), DeliveryError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Writes alerts to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn deliver(&mut self, event: &AlertEvent) -> Result<(), DeliveryError> {
        info!(symbol = %event.symbol, reason = %event.reason(), "\n{}", format_alert(event));
        Ok(())
    }
}
