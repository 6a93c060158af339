//! Batch replay across many (symbol, date) series.

use chrono::NaiveDate;
use floorwatch_core::replay::{ReplayDecision, ReplayEngine};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data_loader::DayBars;

/// Outcome of one series. Input errors are kept per entry so one bad series
/// does not hide the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub symbol: String,
    pub date: NaiveDate,
    pub result: Result<ReplayDecision, String>,
}

impl BatchEntry {
    pub fn decision(&self) -> Option<&ReplayDecision> {
        self.result.as_ref().ok()
    }
}

/// Replay every job, in parallel (rayon) or serially. Entries come back in
/// input order either way.
pub fn run_batch(jobs: &[DayBars], engine: &ReplayEngine, parallel: bool) -> Vec<BatchEntry> {
    let run = |day: &DayBars| BatchEntry {
        symbol: day.symbol.clone(),
        date: day.date,
        result: engine.replay(&day.bars).map_err(|e| e.to_string()),
    };

    if parallel {
        jobs.par_iter().map(run).collect()
    } else {
        jobs.iter().map(run).collect()
    }
}

/// Counts for a batch summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTally {
    pub total: usize,
    pub triggered: usize,
    pub not_triggered: usize,
    pub errors: usize,
}

pub fn tally(entries: &[BatchEntry]) -> BatchTally {
    entries.iter().fold(BatchTally::default(), |mut t, e| {
        t.total += 1;
        match &e.result {
            Ok(d) if d.triggered() => t.triggered += 1,
            Ok(_) => t.not_triggered += 1,
            Err(_) => t.errors += 1,
        }
        t
    })
}
