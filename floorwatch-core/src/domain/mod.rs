//! Domain types shared by the live and replay engines.

pub mod alert;
pub mod bar;
pub mod limit;
pub mod pool;
pub mod rule;
pub mod snapshot;
pub mod symbol;

pub use alert::{AlertEvent, AlertOrigin, BuyFlowMetrics, SellOneMetrics};
pub use bar::MinuteBar;
pub use limit::{has_opened, is_one_word_limit_down, limit_down_from_pre_close, PRICE_EPSILON};
pub use pool::PoolStock;
pub use rule::{RuleId, RuleSet};
pub use snapshot::{Confidence, DataQuality, ValidatedSnapshot};
pub use symbol::{exchange_of, normalize_symbol, prefixed_symbol, Exchange};
