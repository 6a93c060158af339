//! Floorwatch core: domain types and the two detection engines.
//!
//! - [`signal::SignalEngine`] watches a live stream of validated snapshots,
//!   gates on the one-word limit-down condition and alerts at most once per
//!   rule per symbol per day.
//! - [`replay::ReplayEngine`] replays one symbol's minute bars for one day and
//!   returns a single structured decision.
//!
//! The engines share vocabulary ([`domain::RuleId`], the one-word predicate)
//! but no trait. Neither does any I/O.

pub mod domain;
pub mod error;
pub mod replay;
pub mod signal;

pub use error::{EngineError, ReplayError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engines and their outputs can cross threads.
    ///
    /// The session driver moves the live engine onto a worker; batch replay
    /// shares one `ReplayEngine` across rayon workers.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::ValidatedSnapshot>();
        require_sync::<domain::ValidatedSnapshot>();
        require_send::<domain::MinuteBar>();
        require_sync::<domain::MinuteBar>();
        require_send::<domain::AlertEvent>();
        require_sync::<domain::AlertEvent>();
        require_send::<domain::PoolStock>();
        require_sync::<domain::PoolStock>();

        require_send::<signal::SignalEngine>();
        require_send::<signal::SymbolState>();
        require_send::<signal::SignalConfig>();
        require_sync::<signal::SignalConfig>();

        require_send::<replay::ReplayEngine>();
        require_sync::<replay::ReplayEngine>();
        require_send::<replay::ReplayDecision>();
        require_sync::<replay::ReplayDecision>();

        require_send::<EngineError>();
        require_sync::<EngineError>();
        require_send::<ReplayError>();
        require_sync::<ReplayError>();
    }
}
