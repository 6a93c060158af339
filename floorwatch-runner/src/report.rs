//! Text reports, alert bodies and export formats.
//!
//! - **Text**: precheck and per-decision reports for the terminal
//! - **Messages**: alert bodies and the pre-open summary
//! - **CSV**: one row per batch entry
//! - **JSON**: full decisions with `schema_version`

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use floorwatch_core::domain::{prefixed_symbol, AlertEvent, ValidatedSnapshot};
use floorwatch_core::replay::{ReplayDecision, ReplayWindow};
use serde::{Deserialize, Serialize};

use crate::batch::BatchEntry;

pub const SCHEMA_VERSION: u32 = 1;

const STRATEGY_LINES: [&str; 4] = [
    "strategy: buy_flow_breakout",
    "buy_flow_proxy: one_word_limit_down_volume",
    "trigger_rule: current_buy_volume > cumulative_buy_volume_before",
    "cumulative_scope: full_day",
];

// ─── Text ───────────────────────────────────────────────────────────

/// Run parameters, printed before a replay so they can be checked at a glance.
pub fn format_precheck(
    symbol: &str,
    date: Option<NaiveDate>,
    window: &ReplayWindow,
    dataset_hash: &str,
) -> String {
    let mut lines = vec![
        "=== floorwatch replay precheck ===".to_string(),
        format!("code: {symbol}"),
        format!(
            "trade_date: {}",
            date.map_or_else(|| "-".to_string(), |d| d.to_string())
        ),
    ];
    lines.extend(STRATEGY_LINES.iter().map(|s| s.to_string()));
    lines.push("one_word_filter: close==high==limit_down_price".to_string());
    lines.push(format!("session_open: {}", window.session_open().format("%H:%M")));
    lines.push(format!(
        "window: {}-{}",
        window.start().format("%H:%M"),
        window.end().format("%H:%M")
    ));
    lines.push(format!("dataset_hash: {dataset_hash}"));
    lines.join("\n")
}

pub fn format_replay_report(decision: &ReplayDecision) -> String {
    let c = &decision.counters;
    let mut lines = vec![
        "=== floorwatch replay report ===".to_string(),
        format!("code: {}", decision.symbol),
        format!(
            "trade_date: {}",
            decision.date.map_or_else(|| "-".to_string(), |d| d.to_string())
        ),
    ];
    lines.extend(STRATEGY_LINES.iter().map(|s| s.to_string()));
    lines.extend([
        format!(
            "window: {}-{}",
            decision.window_start.format("%H:%M"),
            decision.window_end.format("%H:%M")
        ),
        format!("samples: {}", c.samples),
        format!("samples_in_window: {}", c.samples_in_window),
        format!("samples_one_word_in_window: {}", c.samples_one_word_in_window),
        format!("one_word_samples: {}", c.one_word_samples),
        format!("triggered: {}", if decision.triggered() { "YES" } else { "NO" }),
        format!("reason: {}", decision.outcome.as_str()),
        format!("data_quality: {}", decision.data_quality.as_str()),
        format!("confidence: {}", decision.confidence.as_str()),
    ]);
    if let Some(t) = &decision.trigger {
        lines.push(format!("trigger_time: {}", t.trigger_time.format("%Y-%m-%d %H:%M:%S")));
        lines.push(format!("current_buy_volume: {}", t.current_buy_volume));
        lines.push(format!(
            "cumulative_buy_volume_before: {}",
            t.cumulative_buy_volume_before
        ));
    }
    lines.join("\n")
}

/// Alert message body.
pub fn format_alert(event: &AlertEvent) -> String {
    let quote_code = prefixed_symbol(&event.symbol).unwrap_or_else(|| event.symbol.clone());
    let mut lines = vec![format!("[{}] {} {}", event.reason(), quote_code, event.label())];
    if let Some(m) = &event.sell_one {
        lines.push(format!("previous window sell-one: {}", m.previous_ask_v1));
        lines.push(format!("current window sell-one: {}", m.current_ask_v1));
        lines.push(format!("sell-one drop: {:.2}%", m.drop_ratio * 100.0));
    }
    if let Some(m) = &event.buy_flow {
        lines.push(format!("window buy volume: {}", m.current_buy_volume));
        lines.push(format!("cumulative before: {}", m.cumulative_buy_volume_before));
        lines.push(format!("breakout ratio: {:.2}", m.ratio));
    }
    lines.push(format!(
        "windows: {} -> {}",
        event.prev_window_ts.format("%H:%M:%S"),
        event.curr_window_ts.format("%H:%M:%S")
    ));
    lines.push(format!(
        "data quality: {}/{}",
        event.data_quality.as_str(),
        event.confidence.as_str()
    ));
    lines.push(format!(
        "trigger time: {}",
        event.trigger_ts.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.join("\n")
}

/// Pre-open summary, split into messages of at most `max_rows` rows.
///
/// Every message repeats the header; a `chunk: i/n` line is added when
/// there is more than one. An empty scan yields a single message.
pub fn format_preopen_summary(
    date: NaiveDate,
    run_at: NaiveDateTime,
    snapshots: &[ValidatedSnapshot],
    max_rows: usize,
) -> Vec<String> {
    let head = [
        format!("time: {}", run_at.format("%Y-%m-%d %H:%M:%S")),
        format!("trade_date: {date}"),
        format!(
            "{} one-word limit-down: {}",
            run_at.format("%H:%M"),
            snapshots.len()
        ),
    ];
    if snapshots.is_empty() {
        return vec![format!("{}\nresult: 0", head.join("\n"))];
    }

    let rows: Vec<String> = snapshots
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}) {} {} sell-one: {}",
                i + 1,
                s.symbol,
                s.name.as_deref().unwrap_or("-"),
                s.ask_v1
            )
        })
        .collect();

    let chunks: Vec<&[String]> = rows.chunks(max_rows.max(1)).collect();
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut lines = head.to_vec();
            if total > 1 {
                lines.push(format!("chunk: {}/{total}", i + 1));
            }
            lines.push(String::new());
            lines.extend(chunk.iter().cloned());
            lines.join("\n")
        })
        .collect()
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per entry.
///
/// Columns: symbol, date, outcome, trigger_time, current_buy_volume,
/// cumulative_buy_volume_before, samples, samples_in_window,
/// samples_one_word_in_window, one_word_samples, data_quality, confidence, error
pub fn export_decisions_csv(entries: &[BatchEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "date",
        "outcome",
        "trigger_time",
        "current_buy_volume",
        "cumulative_buy_volume_before",
        "samples",
        "samples_in_window",
        "samples_one_word_in_window",
        "one_word_samples",
        "data_quality",
        "confidence",
        "error",
    ])?;

    for e in entries {
        let row: Vec<String> = match &e.result {
            Ok(d) => {
                let c = &d.counters;
                let trigger = d.trigger.as_ref();
                vec![
                    e.symbol.clone(),
                    e.date.to_string(),
                    d.outcome.as_str().to_string(),
                    trigger.map_or_else(String::new, |t| {
                        t.trigger_time.format("%Y-%m-%d %H:%M:%S").to_string()
                    }),
                    trigger.map_or_else(String::new, |t| t.current_buy_volume.to_string()),
                    trigger.map_or_else(String::new, |t| {
                        t.cumulative_buy_volume_before.to_string()
                    }),
                    c.samples.to_string(),
                    c.samples_in_window.to_string(),
                    c.samples_one_word_in_window.to_string(),
                    c.one_word_samples.to_string(),
                    d.data_quality.as_str().to_string(),
                    d.confidence.as_str().to_string(),
                    String::new(),
                ]
            }
            Err(err) => {
                let mut row = vec![e.symbol.clone(), e.date.to_string(), "error".to_string()];
                row.extend(std::iter::repeat(String::new()).take(9));
                row.push(err.clone());
                row
            }
        };
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema_version: u32,
    pub dataset_hash: String,
    pub entries: Vec<BatchEntry>,
}

/// Serialize batch entries to pretty JSON.
pub fn export_json(entries: &[BatchEntry], dataset_hash: &str) -> Result<String> {
    let report = BatchReport {
        schema_version: SCHEMA_VERSION,
        dataset_hash: dataset_hash.to_string(),
        entries: entries.to_vec(),
    };
    serde_json::to_string_pretty(&report).context("failed to serialize batch report to JSON")
}

/// Deserialize a batch report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BatchReport> {
    let report: BatchReport =
        serde_json::from_str(json).context("failed to deserialize batch report from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}
