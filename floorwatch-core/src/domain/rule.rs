//! Rule identifiers and a compact set type for the one-shot ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger rules. The replay engine only implements `BuyFlowBreakout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Window buy volume (traded-volume proxy) breaks out over everything before it.
    BuyFlowBreakout,
    /// Sell-one queue shrinks sharply between adjacent windows.
    #[serde(rename = "sell1_drop")]
    SellOneDrop,
}

impl RuleId {
    pub const ALL: [RuleId; 2] = [RuleId::BuyFlowBreakout, RuleId::SellOneDrop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuyFlowBreakout => "buy_flow_breakout",
            Self::SellOneDrop => "sell1_drop",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::BuyFlowBreakout => 0b01,
            Self::SellOneDrop => 0b10,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of rules, iterated in declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RuleSet(u8);

impl RuleSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        RuleId::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, rule: RuleId) {
        self.0 |= rule.bit();
    }

    pub fn contains(&self, rule: RuleId) -> bool {
        self.0 & rule.bit() != 0
    }

    pub fn union(self, other: RuleSet) -> RuleSet {
        RuleSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Every rule is present.
    pub fn is_full(&self) -> bool {
        *self == Self::all()
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = RuleId> + '_ {
        RuleId::ALL.into_iter().filter(|r| self.contains(*r))
    }

    /// Rule names joined with `_and_`, e.g. `buy_flow_breakout_and_sell1_drop`.
    pub fn reason(&self) -> String {
        self.iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join("_and_")
    }
}

impl FromIterator<RuleId> for RuleSet {
    fn from_iter<I: IntoIterator<Item = RuleId>>(iter: I) -> Self {
        let mut set = RuleSet::empty();
        for rule in iter {
            set.insert(rule);
        }
        set
    }
}

impl Serialize for RuleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rules = Vec::<RuleId>::deserialize(deserializer)?;
        Ok(rules.into_iter().collect())
    }
}
