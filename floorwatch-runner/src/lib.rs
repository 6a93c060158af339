//! Floorwatch runner: everything around the engines.
//!
//! This crate builds on `floorwatch-core` to provide:
//! - TOML configuration with defaults and validation
//! - CSV loading and mapping into minute bars, snapshots and the pool
//! - The live session driver with pluggable feed and alert sink
//! - Parallel batch replay
//! - The pre-open one-word limit-down scan
//! - Text reports plus CSV and JSON export
//! - Logging initialization

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod logging;
pub mod preopen;
pub mod report;
pub mod session;
pub mod status;

pub use batch::{run_batch, tally, BatchEntry, BatchTally};
pub use config::{
    parse_hhmm, ConfigError, MonitorConfig, PreopenConfig, ReplayConfig, SessionConfig,
};
pub use data_loader::{
    dataset_hash, load_bars, load_pool, load_snapshots, read_bars, read_pool, read_snapshots,
    DayBars, LoadError, MappingOptions,
};
pub use logging::{init_logging, LogFormat};
pub use preopen::scan_preopen_one_word;
pub use report::{
    export_decisions_csv, export_json, format_alert, format_precheck, format_preopen_summary,
    format_replay_report, import_json, BatchReport, SCHEMA_VERSION,
};
pub use session::{
    AlertSink, CollectingSink, DeliveryError, LiveSession, LogSink, RecordedFeed, SessionError,
    SnapshotSource,
};
pub use status::RuntimeStatus;
