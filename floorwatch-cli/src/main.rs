//! Floorwatch CLI: replay, batch, live-session and config commands.
//!
//! Commands:
//! - `replay`: replay one symbol/day of minute bars and print the report
//! - `batch`: replay every symbol/day in a bar file, optionally exporting results
//! - `session`: drive the live engine over a recorded snapshot file
//! - `preopen`: summarize one-word limit-down symbols before the open
//! - `config`: print the default configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use floorwatch_core::domain::normalize_symbol;
use floorwatch_core::replay::ReplayEngine;
use floorwatch_core::signal::SignalEngine;
use floorwatch_runner::{
    dataset_hash, export_decisions_csv, export_json, format_precheck, format_preopen_summary,
    format_replay_report, init_logging, load_bars, load_pool, load_snapshots, parse_hhmm,
    run_batch, scan_preopen_one_word, tally, LiveSession, LogFormat, LogSink, MappingOptions,
    MonitorConfig, RecordedFeed,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "floorwatch",
    about = "Floorwatch: one-word limit-down reversal monitor and replay"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one symbol's minute bars for one trading day.
    Replay {
        /// Minute-bar CSV file.
        #[arg(long)]
        bars: PathBuf,

        /// Symbol code (600000, 600000.SH and sh600000 are all accepted).
        #[arg(long)]
        symbol: String,

        /// Trade date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Window start (HH:MM). Overrides the config file.
        #[arg(long)]
        window_start: Option<String>,

        /// Window end (HH:MM). Overrides the config file.
        #[arg(long)]
        window_end: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the decision as JSON instead of the text report.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay every (symbol, date) series in a minute-bar file.
    Batch {
        /// Minute-bar CSV file.
        #[arg(long)]
        bars: PathBuf,

        /// Export file. `.json` writes the full report, anything else CSV.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Replay on one thread.
        #[arg(long, default_value_t = false)]
        serial: bool,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the live engine over recorded snapshots.
    Session {
        /// Snapshot CSV file.
        #[arg(long)]
        snapshots: PathBuf,

        /// Pool CSV file (`symbol,name[,is_st]`). Names alerts and lets the
        /// session stop once every pool symbol is done.
        #[arg(long)]
        pool: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Summarize symbols sitting on a one-word limit-down at the pre-open scan time.
    Preopen {
        /// Snapshot CSV file.
        #[arg(long)]
        snapshots: PathBuf,

        /// Pool CSV file. Restricts the scan to the pool and names the rows.
        #[arg(long)]
        pool: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    match cli.command {
        Commands::Replay {
            bars,
            symbol,
            date,
            window_start,
            window_end,
            config,
            json,
        } => run_replay_cmd(
            &bars,
            &symbol,
            &date,
            window_start.as_deref(),
            window_end.as_deref(),
            config.as_deref(),
            json,
        ),
        Commands::Batch {
            bars,
            output,
            serial,
            config,
        } => run_batch_cmd(&bars, output.as_deref(), serial, config.as_deref()),
        Commands::Session {
            snapshots,
            pool,
            config,
        } => run_session_cmd(&snapshots, pool.as_deref(), config.as_deref()),
        Commands::Preopen {
            snapshots,
            pool,
            config,
        } => run_preopen_cmd(&snapshots, pool.as_deref(), config.as_deref()),
        Commands::Config => {
            print!("{}", MonitorConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    match path {
        Some(p) => MonitorConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(MonitorConfig::default()),
    }
}

fn run_replay_cmd(
    bars_path: &Path,
    symbol: &str,
    date: &str,
    window_start: Option<&str>,
    window_end: Option<&str>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(s) = window_start {
        config.replay.window_start = Some(parse_hhmm(s).map_err(anyhow::Error::msg)?);
    }
    if let Some(s) = window_end {
        config.replay.window_end = Some(parse_hhmm(s).map_err(anyhow::Error::msg)?);
    }
    let window = config.replay_window()?;

    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date '{date}' (expected YYYY-MM-DD)"))?;
    let symbol = normalize_symbol(symbol);

    let days = load_bars(bars_path, &MappingOptions::from(config.replay))
        .with_context(|| format!("failed to load bars from {}", bars_path.display()))?;
    let Some(day) = days
        .into_iter()
        .find(|d| d.symbol == symbol && d.date == date)
    else {
        bail!(
            "no bars for {symbol} on {date} in {}",
            bars_path.display()
        );
    };

    let hash = dataset_hash(std::slice::from_ref(&day));
    let decision = ReplayEngine::new(window)
        .replay(&day.bars)
        .with_context(|| format!("replay of {symbol} {date} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!("{}", format_precheck(&symbol, Some(date), &window, &hash));
        println!();
        println!("{}", format_replay_report(&decision));
    }
    Ok(())
}

fn run_batch_cmd(
    bars_path: &Path,
    output: Option<&Path>,
    serial: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = ReplayEngine::new(config.replay_window()?);

    let days = load_bars(bars_path, &MappingOptions::from(config.replay))
        .with_context(|| format!("failed to load bars from {}", bars_path.display()))?;
    if days.is_empty() {
        bail!("{} contains no bars", bars_path.display());
    }
    let hash = dataset_hash(&days);

    info!(series = days.len(), parallel = !serial, "batch replay started");
    let entries = run_batch(&days, &engine, !serial);
    let t = tally(&entries);

    for entry in &entries {
        match &entry.result {
            Ok(d) => println!(
                "{} {} {}",
                entry.symbol,
                entry.date,
                d.outcome.as_str()
            ),
            Err(e) => println!("{} {} error: {e}", entry.symbol, entry.date),
        }
    }
    println!(
        "total={} triggered={} not_triggered={} errors={} dataset_hash={hash}",
        t.total, t.triggered, t.not_triggered, t.errors
    );

    if let Some(path) = output {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let body = if is_json {
            export_json(&entries, &hash)?
        } else {
            export_decisions_csv(&entries)?
        };
        std::fs::write(path, body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    if t.errors > 0 {
        eprintln!("{} series could not be replayed", t.errors);
        std::process::exit(1);
    }
    Ok(())
}

fn run_session_cmd(
    snapshots_path: &Path,
    pool_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshots = load_snapshots(snapshots_path)
        .with_context(|| format!("failed to load snapshots from {}", snapshots_path.display()))?;

    let feed = RecordedFeed::new(snapshots);
    let Some(date) = feed.first_date() else {
        bail!("{} contains no snapshots", snapshots_path.display());
    };

    let mut engine = SignalEngine::new(config.signal);
    if let Some(path) = pool_path {
        let pool = load_pool(path)
            .with_context(|| format!("failed to load pool from {}", path.display()))?;
        info!(stocks = pool.len(), st = pool.iter().filter(|s| s.is_st).count(), "pool loaded");
        engine.register_pool(pool);
    }
    let mut session = LiveSession::new(engine, feed, LogSink, config.session);
    let alerts = session.run(date)?;

    println!("session {date}: {} alert(s)", alerts.len());
    for event in &alerts {
        println!(
            "{} {} {} {}",
            event.trigger_ts.format("%H:%M:%S"),
            event.symbol,
            event.reason(),
            event.label()
        );
    }
    println!("{}", session.status().summary_line());
    Ok(())
}

fn run_preopen_cmd(
    snapshots_path: &Path,
    pool_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshots = load_snapshots(snapshots_path)
        .with_context(|| format!("failed to load snapshots from {}", snapshots_path.display()))?;
    let Some(date) = snapshots.iter().map(|s| s.ts.date()).min() else {
        bail!("{} contains no snapshots", snapshots_path.display());
    };
    let pool = match pool_path {
        Some(path) => load_pool(path)
            .with_context(|| format!("failed to load pool from {}", path.display()))?,
        None => Vec::new(),
    };

    let scan_time = config.preopen.scan_time;
    let selected = scan_preopen_one_word(&snapshots, date, scan_time, &pool);
    info!(%date, one_word = selected.len(), "pre-open scan finished");

    let messages = format_preopen_summary(
        date,
        date.and_time(scan_time),
        &selected,
        config.preopen.max_rows_per_chunk,
    );
    println!("{}", messages.join("\n\n"));
    Ok(())
}
