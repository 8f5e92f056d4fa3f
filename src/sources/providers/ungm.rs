// src/sources/providers/ungm.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{attr, first_match, first_text, select_any, span_or_text, text_of, PageParser};

const NA: &str = "N/A";

/// UNOPS notices on the UN Global Marketplace.
pub struct Ungm;

impl PageParser for Ungm {
    fn key(&self) -> &'static str {
        "ungm"
    }

    fn url(&self) -> &'static str {
        "https://www.ungm.org/Public/Notice?agencyEnglishAbbreviation=UNOPS"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        let na = || NA.to_string();

        select_any(doc.root_element(), &["div.tableRow.dataRow.notice-table"])
            .into_iter()
            .map(|row| {
                let cells = select_any(row, &["div.tableCell"]);
                let cell_text = |i: usize| cells.get(i).map(|c| text_of(*c)).unwrap_or_else(na);

                let title =
                    first_text(row, &["span.ungm-title.ungm-title--small"]).unwrap_or_else(na);
                let deadline =
                    first_text(row, &["div.tableCell.resultInfo1.deadline span"]).unwrap_or_else(na);
                let organization = first_text(row, &["div.tableCell.resultAgency"])
                    .unwrap_or_else(|| "UNOPS".to_string());
                let reference = first_match(
                    row,
                    &["div.tableCell.resultInfo1[data-description='Reference']"],
                )
                .map(span_or_text)
                .unwrap_or_else(na);
                let country = cells.last().map(|c| text_of(*c)).unwrap_or_else(na);

                let notice_id = attr(row, "data-noticeid").unwrap_or_default();
                let detail_url = if notice_id.is_empty() {
                    String::new()
                } else {
                    base.join(&format!("/Public/Notice/{notice_id}"))
                        .map(|u| u.to_string())
                        .unwrap_or_default()
                };

                record_from([
                    ("title", title),
                    ("reference", reference),
                    ("notice_id", notice_id),
                    ("organization", organization),
                    ("opportunity_type", cell_text(5)),
                    ("published_date", cell_text(3)),
                    ("deadline", deadline),
                    ("country", country),
                    ("remaining_days", first_text(row, &["span.remainingDays"]).unwrap_or_default()),
                    ("detail_url", detail_url),
                ])
            })
            .collect()
    }

    fn sample(&self) -> Vec<Record> {
        vec![
            record_from([
                ("title", "Construction of Dedicated Accommodation Facility to Enhance BIPSOT's Capacity for Training Female Peacekeepers"),
                ("reference", "ITB/2026/61380"),
                ("organization", "UNOPS"),
                ("opportunity_type", "Invitation to bid"),
                ("published_date", "12-Feb-2026"),
                ("deadline", "01-Mar-2026 11:00 (GMT 0.00)"),
                ("country", "Bangladesh"),
                ("remaining_days", "Expires within 15 days"),
            ]),
            record_from([
                ("title", "Expression of Interest (EOI): Third-Party Monitoring (TPM) Services"),
                ("reference", "Expression of Interest (EOI): Third-Party Monitoring (TPM) Services"),
                ("organization", "UNOPS"),
                ("opportunity_type", "Request for EOI"),
                ("published_date", "21-Jan-2026"),
                ("deadline", "14-Feb-2026 00:00 (GMT 3.00)"),
                ("country", "Multiple destinations"),
                ("remaining_days", "Expires within 24 hours"),
            ]),
        ]
    }
}

/// Notices whose country mentions `country` (case-insensitive).
pub fn filter_by_country(records: &[Record], country: &str) -> Vec<Record> {
    let needle = country.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.get("country")
                .and_then(|v| v.as_str())
                .map(|c| c.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Notices whose "Expires within N ..." hint is at most `days`.
pub fn filter_by_deadline(records: &[Record], days: u32) -> Vec<Record> {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"within (\d+)").expect("remaining-days regex"));
    records
        .iter()
        .filter(|r| {
            r.get("remaining_days")
                .and_then(|v| v.as_str())
                .and_then(|s| re.captures(s))
                .and_then(|c| c[1].parse::<u32>().ok())
                .is_some_and(|n| n <= days)
        })
        .cloned()
        .collect()
}
