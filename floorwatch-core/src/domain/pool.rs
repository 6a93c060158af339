//! PoolStock: one entry of the day's monitoring pool.

use serde::{Deserialize, Serialize};

use super::symbol::normalize_symbol;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStock {
    pub symbol: String,
    pub name: String,
    /// Special-treatment name.
    #[serde(default)]
    pub is_st: bool,
}

impl PoolStock {
    /// Builds a pool entry, normalising the code and flagging ST names.
    pub fn new(symbol: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        let is_st = name
            .trim_start_matches('*')
            .to_ascii_uppercase()
            .starts_with("ST");
        Self {
            symbol: normalize_symbol(symbol),
            name,
            is_st,
        }
    }
}
