// src/sources/providers/bppa.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{absolute_url, attr, first_match, select_any, text_lines, text_of, PageParser};

/// Advertisement notices published by the Bangladesh Public Procurement Authority.
pub struct Bppa;

impl PageParser for Bppa {
    fn key(&self) -> &'static str {
        "bppa"
    }

    fn url(&self) -> &'static str {
        "https://www.bppa.gov.bd/advertisement-notices/advertisement-services.html"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        let Some(content) = first_match(doc.root_element(), &["div#bodyContent", ".content"]) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for row in select_any(content, &["table tbody tr"]) {
            let cells = select_any(row, &["td"]);
            if cells.len() < 6 {
                continue;
            }

            // Title cell: link text, then the reference number after a <br>.
            let title_cell = cells[1];
            let lines = text_lines(title_cell);
            let (title, detail_url) = match first_match(title_cell, &["a"]) {
                Some(a) => (
                    text_of(a),
                    attr(a, "href")
                        .map(|h| absolute_url(base, &h))
                        .unwrap_or_default(),
                ),
                None => (text_of(title_cell), String::new()),
            };
            let reference = lines
                .iter()
                .find(|l| **l != title)
                .cloned()
                .unwrap_or_default();

            let closing = text_lines(cells[4]);

            out.push(record_from([
                ("sl_no", text_of(cells[0])),
                ("title", title),
                ("reference_no", reference),
                ("procuring_entity", text_of(cells[2])),
                ("publication_date", text_of(cells[3])),
                ("closing_date", closing.first().cloned().unwrap_or_default()),
                ("closing_time", closing.get(1).cloned().unwrap_or_default()),
                ("place", text_of(cells[5])),
                ("detail_url", detail_url),
            ]));
        }
        out
    }

    fn sample(&self) -> Vec<Record> {
        vec![
            record_from([
                ("sl_no", "1"),
                ("title", "Procurement of Medical Equipment for District Hospitals"),
                ("reference_no", "DGHS/PROC/2025/112"),
                ("procuring_entity", "Directorate General of Health Services"),
                ("publication_date", "10-Feb-2025"),
                ("closing_date", "12-Mar-2025"),
                ("closing_time", "12:00 PM"),
                ("place", "Dhaka"),
                ("detail_url", ""),
            ]),
            record_from([
                ("sl_no", "2"),
                ("title", "Rehabilitation of Upazila Road Network"),
                ("reference_no", "LGED/RD/2025/37"),
                ("procuring_entity", "Local Government Engineering Department"),
                ("publication_date", "11-Feb-2025"),
                ("closing_date", "15-Mar-2025"),
                ("closing_time", "1:00 PM"),
                ("place", "Sylhet"),
                ("detail_url", ""),
            ]),
        ]
    }
}

/// Notices whose `place` mentions `place` (case-insensitive).
pub fn filter_by_place(records: &[Record], place: &str) -> Vec<Record> {
    let needle = place.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.get("place")
                .and_then(|v| v.as_str())
                .is_some_and(|p| p.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
