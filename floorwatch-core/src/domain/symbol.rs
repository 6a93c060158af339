//! Symbol normalisation for A-share codes.
//!
//! Feeds spell the same listing many ways (`600000`, `sh600000`,
//! `600000.SH`, `600000.XSHG`). Everything inside the engines keys on the bare
//! six-digit code.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
    Beijing,
}

impl Exchange {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Shanghai => "sh",
            Self::Shenzhen => "sz",
            Self::Beijing => "bj",
        }
    }
}

/// Strip exchange prefixes/suffixes and whitespace; returns the bare code.
///
/// Unknown shapes are returned trimmed and otherwise unchanged.
pub fn normalize_symbol(raw: &str) -> String {
    let s = raw.trim();
    let lower = s.to_ascii_lowercase();
    ["sh", "sz", "bj"]
        .iter()
        .find_map(|p| lower.strip_prefix(p))
        .filter(|rest| rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty())
        .map(|rest| rest.to_string())
        .unwrap_or_else(|| match s.split_once('.') {
            Some((code, _)) if code.chars().all(|c| c.is_ascii_digit()) => code.to_string(),
            _ => s.to_string(),
        })
}

/// Exchange implied by a bare six-digit code.
pub fn exchange_of(code: &str) -> Option<Exchange> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match code.as_bytes()[0] {
        b'6' | b'9' => Some(Exchange::Shanghai),
        b'0' | b'2' | b'3' => Some(Exchange::Shenzhen),
        b'4' | b'8' => Some(Exchange::Beijing),
        _ => None,
    }
}

/// Code with the lowercase exchange prefix used by quote endpoints, e.g. `sh600000`.
pub fn prefixed_symbol(code: &str) -> Option<String> {
    exchange_of(code).map(|ex| format!("{}{}", ex.prefix(), code))
}
