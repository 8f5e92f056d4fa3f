// src/record.rs
//! Record shape shared by every source adapter, plus text helpers the
//! HTML adapters use to clean scraped cell contents.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};

/// One tender/notice. Field set is adapter-specific; the aggregator only
/// relies on the `source` field it injects itself.
pub type Record = Map<String, Value>;

/// Field injected into every record by the aggregate views.
pub const SOURCE_FIELD: &str = "source";

/// Build a record from `(field, value)` pairs.
pub fn record_from<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Clone `record` and tag it with its owning source key.
/// Any adapter-provided `source` value is replaced.
pub fn tagged(record: &Record, source: &str) -> Record {
    let mut out = record.clone();
    out.insert(SOURCE_FIELD.to_string(), Value::String(source.to_string()));
    out
}

/// Normalize scraped text: decode HTML entities, strip stray tags,
/// collapse whitespace and trim.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    let decoded = html_escape::decode_html_entities(s);
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    let stripped = re_tags.replace_all(&decoded, "");

    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&stripped, " ").trim().to_string()
}
