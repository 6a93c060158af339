//! Backtest replay over minute bars.

pub mod accumulator;
pub mod decision;
pub mod engine;
pub mod window;

pub use accumulator::{BacktestAccumulator, TriggerDetail};
pub use decision::{ReplayCounters, ReplayDecision, ReplayOutcome};
pub use engine::{replay, ReplayEngine};
pub use window::{default_session_open, ReplayWindow};
