//! Pre-open scan: which symbols sit on a one-word limit-down before the open.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveTime};
use floorwatch_core::domain::{PoolStock, ValidatedSnapshot};
use tracing::debug;

/// Latest snapshot per symbol on `date` at or before `scan_time`, keeping
/// only one-word limit-down quotes, sorted by symbol then name.
///
/// A non-empty `pool` restricts the scan to its symbols and names rows
/// that arrived without one.
pub fn scan_preopen_one_word(
    snapshots: &[ValidatedSnapshot],
    date: NaiveDate,
    scan_time: NaiveTime,
    pool: &[PoolStock],
) -> Vec<ValidatedSnapshot> {
    let pool: HashMap<&str, &PoolStock> = pool.iter().map(|s| (s.symbol.as_str(), s)).collect();

    let mut latest: BTreeMap<&str, &ValidatedSnapshot> = BTreeMap::new();
    for snap in snapshots {
        if snap.ts.date() != date || snap.ts.time() > scan_time {
            continue;
        }
        if !pool.is_empty() && !pool.contains_key(snap.symbol.as_str()) {
            continue;
        }
        let slot = latest.entry(snap.symbol.as_str()).or_insert(snap);
        if snap.ts >= slot.ts {
            *slot = snap;
        }
    }

    let scanned = latest.len();
    let mut selected: Vec<ValidatedSnapshot> = latest
        .into_values()
        .filter(|s| s.is_one_word_limit_down())
        .map(|s| {
            let mut s = s.clone();
            if s.name.is_none() {
                s.name = pool.get(s.symbol.as_str()).map(|p| p.name.clone());
            }
            s
        })
        .collect();
    selected.sort_by(|a, b| (&a.symbol, &a.name).cmp(&(&b.symbol, &b.name)));

    debug!(%date, %scan_time, scanned, one_word = selected.len(), "pre-open scan");
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorwatch_core::domain::DataQuality;

    fn quote(symbol: &str, h: u32, m: u32, one_word: bool) -> ValidatedSnapshot {
        ValidatedSnapshot {
            symbol: symbol.into(),
            name: None,
            ts: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            current_price: if one_word { 9.0 } else { 9.1 },
            high_price: if one_word { 9.0 } else { 9.1 },
            limit_down_price: 9.0,
            ask_v1: 1000,
            volume: 0,
            data_quality: DataQuality::TickLevel,
        }
    }

    fn scan_time() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 26, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[test]
    fn latest_quote_before_the_scan_decides() {
        let snapshots = vec![
            quote("600002", 9, 25, true),
            // Opened at 09:25, back on the floor by 09:26.
            quote("600001", 9, 25, false),
            quote("600001", 9, 26, true),
            // Left the floor at 09:26.
            quote("600003", 9, 20, true),
            quote("600003", 9, 26, false),
            // After the scan time.
            quote("600004", 9, 31, true),
        ];
        let selected = scan_preopen_one_word(&snapshots, day(), scan_time(), &[]);
        let symbols: Vec<&str> = selected.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, ["600001", "600002"]);
    }

    #[test]
    fn pool_restricts_and_names() {
        let pool = vec![PoolStock {
            symbol: "600002".into(),
            name: "Demo".into(),
            is_st: false,
        }];
        let snapshots = vec![quote("600001", 9, 25, true), quote("600002", 9, 25, true)];
        let selected = scan_preopen_one_word(&snapshots, day(), scan_time(), &pool);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].symbol, "600002");
        assert_eq!(selected[0].name.as_deref(), Some("Demo"));
    }

    #[test]
    fn other_days_are_ignored() {
        let snapshots = vec![quote("600001", 9, 25, true)];
        let next_day = day().succ_opt().unwrap();
        assert!(scan_preopen_one_word(&snapshots, next_day, scan_time(), &[]).is_empty());
    }
}
