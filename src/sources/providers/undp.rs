// src/sources/providers/undp.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{attr, select_any, span_or_text, PageParser};

const MAX_ITEMS: usize = 50;

/// UNDP procurement notices. Rows hidden with inline `display: none` are
/// pagination leftovers and are skipped. No sample listings.
pub struct Undp;

impl PageParser for Undp {
    fn key(&self) -> &'static str {
        "undp"
    }

    fn url(&self) -> &'static str {
        "https://procurement-notices.undp.org/"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        select_any(doc.root_element(), &["a.vacanciesTableLink"])
            .into_iter()
            .filter(|item| {
                !attr(*item, "style")
                    .map(|s| s.replace(' ', "").contains("display:none"))
                    .unwrap_or(false)
            })
            .take(MAX_ITEMS)
            .filter_map(|item| {
                let cells = select_any(item, &["div.vacanciesTable__cell"]);
                if cells.len() < 6 {
                    return None;
                }
                let detail_url = attr(item, "href")
                    .and_then(|h| base.join(&h).ok())
                    .map(|u| u.to_string())
                    .unwrap_or_default();

                Some(record_from([
                    ("title", span_or_text(cells[0])),
                    ("ref_no", span_or_text(cells[1])),
                    ("country", span_or_text(cells[2])),
                    ("country_code", attr(item, "data-region").unwrap_or_default()),
                    ("process_type", span_or_text(cells[3])),
                    ("deadline", span_or_text(cells[4])),
                    ("posted_date", span_or_text(cells[5])),
                    ("detail_url", detail_url),
                ]))
            })
            .collect()
    }
}
