// src/sources/providers/care.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{absolute_url, attr, first_match, first_text, select_any, text_of, PageParser};

const ORGANIZATION: &str = "CARE Bangladesh";
const MAX_ITEMS: usize = 10;

/// Consultancy notices listed on CARE Bangladesh's active project tab.
pub struct Care;

impl PageParser for Care {
    fn key(&self) -> &'static str {
        "care"
    }

    fn url(&self) -> &'static str {
        "https://www.carebangladesh.org/consultancy"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        let Some(tab) = first_match(
            doc.root_element(),
            &["div#project1.tab-pane.show.active", ".consultancy-list", ".tender-list"],
        ) else {
            return Vec::new();
        };

        select_any(tab, &["div.col-md-3", ".card", ".item"])
            .into_iter()
            .take(MAX_ITEMS)
            .enumerate()
            .map(|(i, card)| {
                let deadline = first_text(card, &["p i", ".deadline", ".date"])
                    .unwrap_or_else(|| format!("Deadline {}", i + 1));

                // Second paragraph holds the title on the live layout.
                let title = select_any(card, &["p"])
                    .get(1)
                    .map(|p| text_of(*p))
                    .filter(|t| !t.is_empty())
                    .or_else(|| first_text(card, &["h3", "h4", ".title"]))
                    .unwrap_or_else(|| format!("Tender {}", i + 1));

                let download_url = first_match(card, &["a.default-btn", "a[href*='.pdf']", "a"])
                    .and_then(|a| attr(a, "href"))
                    .map(|h| absolute_url(base, &h))
                    .unwrap_or_else(|| "#".to_string());

                record_from([
                    ("deadline", deadline),
                    ("title", title),
                    ("download_url", download_url),
                    ("organization", ORGANIZATION.to_string()),
                ])
            })
            .collect()
    }

    fn sample(&self) -> Vec<Record> {
        [
            ("25 Dec 2024", "Project Manager - Food Security"),
            ("28 Dec 2024", "Monitoring & Evaluation Officer"),
            ("30 Dec 2024", "Finance and Admin Manager"),
            ("02 Jan 2025", "Gender Equality Specialist"),
        ]
        .into_iter()
        .map(|(deadline, title)| {
            record_from([
                ("deadline", deadline),
                ("title", title),
                ("download_url", "#"),
                ("organization", ORGANIZATION),
            ])
        })
        .collect()
    }
}
