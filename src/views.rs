// src/views.rs
//! Aggregate views over the cache: combined source-tagged list, CSV export
//! and per-source statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::aggregator::Aggregator;
use crate::record::{tagged, Record};

/// Returned by [`to_csv`] when there is nothing to export.
pub const NO_DATA_SENTINEL: &str = "No data available";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub cached: bool,
    pub display_name: String,
}

/// Every cached record, tagged with its source key. Sources appear in
/// ascending key order; records of one source stay contiguous and keep the
/// adapter's order. Cached records are cloned, never mutated.
pub fn combined(agg: &Aggregator) -> Vec<Record> {
    agg.snapshots()
        .iter()
        .flat_map(|(key, snap)| snap.data.iter().map(move |r| tagged(r, key)))
        .collect()
}

/// Stats for every registered source, including never-fetched ones.
pub fn stats(agg: &Aggregator) -> BTreeMap<String, SourceStats> {
    agg.registry()
        .list()
        .into_iter()
        .map(|info| {
            let snap = agg.cached(&info.key).unwrap_or_default();
            let stats = SourceStats {
                count: snap.data.len(),
                last_updated: snap.fetched_at,
                cached: snap.is_cached(),
                display_name: info.display_name,
            };
            (info.key, stats)
        })
        .collect()
}

/// Columnar projection: header is the sorted union of field names, every
/// cell is quoted with embedded quotes doubled, missing fields are `""`.
pub fn to_csv(records: &[Record]) -> String {
    if records.is_empty() {
        return NO_DATA_SENTINEL.to_string();
    }

    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut out = String::new();
    push_row(&mut out, columns.iter().map(|c| c.to_string()));
    for r in records {
        push_row(
            &mut out,
            columns
                .iter()
                .map(|c| r.get(*c).map(cell_text).unwrap_or_default()),
        );
    }
    out
}

fn push_row<I: Iterator<Item = String>>(out: &mut String, cells: I) {
    let quoted: Vec<String> = cells
        .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
        .collect();
    out.push_str(&quoted.join(","));
    out.push('\n');
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}
