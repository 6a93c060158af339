//! Live signal engine: one-word gating, two trigger rules, one alert per rule per day.

pub mod config;
pub mod engine;
pub mod rules;
pub mod state;

pub use config::{SignalConfig, VolumeSemantics, MAX_CONFIRM_WINDOWS};
pub use engine::{EngineSummary, SignalEngine};
pub use rules::{buy_flow_breakout, sell_one_drop};
pub use state::{RuleStreaks, SymbolState, WindowFeatures};
