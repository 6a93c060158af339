//! CSV loading and mapping into engine inputs.
//!
//! Three inputs are supported:
//! - minute bars (`symbol,ts,close,high,limit_down_price,pre_close,volume`),
//!   grouped into one [`DayBars`] per symbol and trading date
//! - quote snapshots
//!   (`symbol,name,ts,current_price,high_price,limit_down_price,ask_v1,volume,data_quality`)
//! - the monitoring pool (`symbol,name[,is_st]`)
//!
//! Empty cells and `-` mean "missing". Ordering bars within a day is done
//! here; the replay engine rejects anything unsorted.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use floorwatch_core::domain::{
    limit_down_from_pre_close, normalize_symbol, DataQuality, MinuteBar, PoolStock,
    ValidatedSnapshot,
};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ReplayConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {reason}")]
    Mapping { line: u64, reason: String },
}

/// How raw bar rows become [`MinuteBar`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingOptions {
    pub limit_down_ratio: f64,
    /// Derive a missing limit price from `pre_close`. When false the price
    /// stays absent and the replay engine reports it.
    pub allow_limit_fallback: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        ReplayConfig::default().into()
    }
}

impl From<ReplayConfig> for MappingOptions {
    fn from(config: ReplayConfig) -> Self {
        Self {
            limit_down_ratio: config.limit_down_ratio,
            allow_limit_fallback: config.allow_limit_fallback,
        }
    }
}

/// One symbol's bars for one trading date, in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBars {
    pub symbol: String,
    pub date: NaiveDate,
    pub bars: Vec<MinuteBar>,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    symbol: String,
    ts: String,
    close: String,
    high: String,
    #[serde(default)]
    limit_down_price: Option<String>,
    #[serde(default)]
    pre_close: Option<String>,
    #[serde(default)]
    volume: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    ts: String,
    current_price: String,
    high_price: String,
    limit_down_price: String,
    #[serde(default)]
    ask_v1: Option<String>,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    data_quality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PoolRow {
    symbol: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_st: Option<String>,
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a minute-bar CSV file.
pub fn load_bars(path: &Path, options: &MappingOptions) -> Result<Vec<DayBars>, LoadError> {
    read_bars(open(path)?, options)
}

/// Load a snapshot CSV file.
pub fn load_snapshots(path: &Path) -> Result<Vec<ValidatedSnapshot>, LoadError> {
    read_snapshots(open(path)?)
}

/// Load a pool CSV file.
pub fn load_pool(path: &Path) -> Result<Vec<PoolStock>, LoadError> {
    read_pool(open(path)?)
}

/// Parse minute bars and group them by `(symbol, date)`, sorted by symbol,
/// then date, then time.
pub fn read_bars<R: Read>(
    reader: R,
    options: &MappingOptions,
) -> Result<Vec<DayBars>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut groups: BTreeMap<(String, NaiveDate), Vec<MinuteBar>> = BTreeMap::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(i as u64 + 2, |p| p.line());
        let row: BarRow = record.deserialize(Some(&headers))?;
        let bar = map_bar(row, options).map_err(|reason| LoadError::Mapping { line, reason })?;
        groups
            .entry((bar.symbol.clone(), bar.trade_date()))
            .or_default()
            .push(bar);
    }

    Ok(groups
        .into_iter()
        .map(|((symbol, date), mut bars)| {
            bars.sort_by_key(|b| b.ts);
            DayBars { symbol, date, bars }
        })
        .collect())
}

/// Parse snapshots in file order.
pub fn read_snapshots<R: Read>(reader: R) -> Result<Vec<ValidatedSnapshot>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(i as u64 + 2, |p| p.line());
        let row: SnapshotRow = record.deserialize(Some(&headers))?;
        out.push(map_snapshot(row).map_err(|reason| LoadError::Mapping { line, reason })?);
    }
    Ok(out)
}

fn map_bar(row: BarRow, options: &MappingOptions) -> Result<MinuteBar, String> {
    let pre_close = cell(&row.pre_close).map(|v| parse_f64("pre_close", v)).transpose()?;
    let mut limit_down_price = cell(&row.limit_down_price)
        .map(|v| parse_f64("limit_down_price", v))
        .transpose()?;
    if limit_down_price.is_none() && options.allow_limit_fallback {
        limit_down_price = pre_close
            .filter(|p| *p > 0.0)
            .map(|p| limit_down_from_pre_close(p, options.limit_down_ratio));
    }

    Ok(MinuteBar {
        symbol: required_symbol(&row.symbol)?,
        ts: parse_ts(&row.ts)?,
        close: required_f64("close", &row.close)?,
        high: required_f64("high", &row.high)?,
        limit_down_price,
        volume: optional_u64("volume", &row.volume)?,
    })
}

fn map_snapshot(row: SnapshotRow) -> Result<ValidatedSnapshot, String> {
    let data_quality = match cell(&row.data_quality) {
        None | Some("tick_level") => DataQuality::TickLevel,
        Some("minute_proxy") => DataQuality::MinuteProxy,
        Some(other) => return Err(format!("unknown data_quality '{other}'")),
    };
    Ok(ValidatedSnapshot {
        symbol: required_symbol(&row.symbol)?,
        name: cell(&row.name).map(str::to_string),
        ts: parse_ts(&row.ts)?,
        current_price: required_f64("current_price", &row.current_price)?,
        high_price: required_f64("high_price", &row.high_price)?,
        limit_down_price: required_f64("limit_down_price", &row.limit_down_price)?,
        // "no order" on the quote side means an empty queue
        ask_v1: optional_u64("ask_v1", &row.ask_v1)?.unwrap_or(0),
        volume: optional_u64("volume", &row.volume)?.unwrap_or(0),
        data_quality,
    })
}

/// Parse pool rows; duplicate symbols keep the first row.
///
/// Without an `is_st` column the flag is derived from the name.
pub fn read_pool<R: Read>(reader: R) -> Result<Vec<PoolStock>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut out: Vec<PoolStock> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(i as u64 + 2, |p| p.line());
        let row: PoolRow = record.deserialize(Some(&headers))?;
        let stock = map_pool(row).map_err(|reason| LoadError::Mapping { line, reason })?;
        if !out.iter().any(|s| s.symbol == stock.symbol) {
            out.push(stock);
        }
    }
    Ok(out)
}

fn map_pool(row: PoolRow) -> Result<PoolStock, String> {
    let symbol = required_symbol(&row.symbol)?;
    let name = cell(&row.name).unwrap_or(symbol.as_str()).to_string();
    let mut stock = PoolStock::new(&symbol, name);
    if let Some(flag) = cell(&row.is_st) {
        stock.is_st = matches!(
            flag.to_ascii_lowercase().as_str(),
            "1" | "true" | "t" | "yes" | "y"
        );
    }
    Ok(stock)
}

/// Present, non-placeholder cell content.
fn cell(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty() && *v != "-")
}

fn required_f64(field: &str, raw: &str) -> Result<f64, String> {
    let v = raw.trim();
    if v.is_empty() || v == "-" {
        return Err(format!("{field} is missing"));
    }
    parse_f64(field, v)
}

fn required_symbol(raw: &str) -> Result<String, String> {
    let symbol = normalize_symbol(raw);
    if symbol.is_empty() {
        Err("symbol is missing".into())
    } else {
        Ok(symbol)
    }
}

fn parse_f64(field: &str, v: &str) -> Result<f64, String> {
    v.parse::<f64>()
        .map_err(|e| format!("{field}: cannot parse '{v}': {e}"))
}

fn optional_u64(field: &str, raw: &Option<String>) -> Result<Option<u64>, String> {
    cell(raw).map(|v| parse_u64(field, v)).transpose()
}

/// Volumes may be written as floats by some exporters (`1200.0`).
fn parse_u64(field: &str, v: &str) -> Result<u64, String> {
    if let Ok(n) = v.parse::<u64>() {
        return Ok(n);
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(format!("{field}: '{v}' is not a non-negative integer")),
    }
}

/// Accepts `YYYY-MM-DD HH:MM[:SS]` with a space or `T` separator.
pub fn parse_ts(raw: &str) -> Result<NaiveDateTime, String> {
    let v = raw.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(v, fmt).ok())
        .ok_or_else(|| format!("ts: cannot parse '{v}'"))
}

/// BLAKE3 over the loaded bars, for report fingerprints.
///
/// Input is already in canonical (symbol, date, time) order.
pub fn dataset_hash(days: &[DayBars]) -> String {
    let mut hasher = blake3::Hasher::new();
    for day in days {
        hasher.update(day.symbol.as_bytes());
        hasher.update(day.date.to_string().as_bytes());
        for bar in &day.bars {
            hasher.update(bar.ts.to_string().as_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.limit_down_price.unwrap_or(f64::NAN).to_le_bytes());
            hasher.update(&bar.volume.map_or(u64::MAX, |v| v).to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
