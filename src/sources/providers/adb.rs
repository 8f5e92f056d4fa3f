// src/sources/providers/adb.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{absolute_url, attr, first_match, first_text, select_any, text_of, PageParser};

const MAX_ITEMS: usize = 10;

/// Asian Development Bank projects for Bangladesh.
pub struct Adb;

impl PageParser for Adb {
    fn key(&self) -> &'static str {
        "adb"
    }

    fn url(&self) -> &'static str {
        "https://www.adb.org/projects/country/bangladesh"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        select_any(
            doc.root_element(),
            &[".list .item.linked", ".project-item", ".views-row"],
        )
        .into_iter()
        .take(MAX_ITEMS)
        .filter_map(|item| {
            let title_el = first_match(item, &[".item-title a"])?;
            let title = text_of(title_el);
            let url = absolute_url(base, &attr(title_el, "href").unwrap_or_default());

            // "<project id>; <country>; <sector>"
            let summary = first_text(item, &[".item-summary"]).unwrap_or_default();
            let parts: Vec<&str> = summary.split(';').map(str::trim).collect();
            let (project_id, sector) = if parts.len() > 1 {
                (
                    parts[0].to_string(),
                    parts.get(2).map(|s| s.to_string()).unwrap_or_default(),
                )
            } else {
                (String::new(), String::new())
            };

            let status =
                first_text(item, &[".item-meta span"]).unwrap_or_else(|| "Active".to_string());

            let approval_date = select_any(item, &[".item-meta div"])
                .into_iter()
                .map(text_of)
                .find_map(|t| {
                    ["Approval Date:", "Approval Year:"]
                        .iter()
                        .find_map(|label| t.split_once(label).map(|(_, v)| v.trim().to_string()))
                })
                .unwrap_or_default();

            Some(record_from([
                ("title", title),
                ("project_id", project_id),
                ("status", status),
                ("approval_date", approval_date),
                ("sector", sector),
                ("url", url),
                ("summary", summary),
            ]))
        })
        .collect()
    }

    fn sample(&self) -> Vec<Record> {
        [
            (
                "Third Urban Governance and Infrastructure Improvement Project",
                "55032-002",
                "2024",
                "Water and other urban infrastructure and services",
            ),
            ("SASEC Road Connectivity Project", "52057-003", "2023", "Transport"),
            ("Skills for Employment Investment Program", "47057-003", "2024", "Education"),
        ]
        .into_iter()
        .map(|(title, id, year, sector)| {
            record_from([
                ("title", title.to_string()),
                ("project_id", id.to_string()),
                ("status", "Active".to_string()),
                ("approval_date", year.to_string()),
                ("sector", sector.to_string()),
                ("url", "#".to_string()),
                ("summary", format!("{id}; Bangladesh; {sector}")),
            ])
        })
        .collect()
    }
}
