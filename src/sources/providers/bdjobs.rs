// src/sources/providers/bdjobs.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{absolute_url, attr, first_match, first_text, select_any, text_of, PageParser};

const PLACEHOLDER_LOGO: &str = "https://via.placeholder.com/60x60?text=BD";
const MAX_ITEMS: usize = 10;

/// Tender cards on the BDJobs tender board.
pub struct BdJobs;

impl PageParser for BdJobs {
    fn key(&self) -> &'static str {
        "bdjobs"
    }

    fn url(&self) -> &'static str {
        "https://bdjobs.com/h/"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        let posted = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let cards = select_any(
            doc.root_element(),
            &["app-tender-card", ".card", "div[class*='tender']"],
        );

        cards
            .into_iter()
            .take(MAX_ITEMS)
            .enumerate()
            .map(|(i, card)| {
                let organization = first_text(card, &["div[title]", ".company-name", ".organization"])
                    .unwrap_or_else(|| format!("Organization {}", i + 1));

                let anchor = first_match(card, &["a[href]", "a"]);
                let title = anchor
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("Tender {}", i + 1));
                let link = anchor
                    .and_then(|a| attr(a, "href"))
                    .map(|h| absolute_url(base, &h))
                    .unwrap_or_else(|| "#".to_string());

                let logo = first_match(card, &["img"])
                    .and_then(|img| attr(img, "src"))
                    .map(|src| absolute_url(base, &src))
                    .unwrap_or_else(|| PLACEHOLDER_LOGO.to_string());

                record_from([
                    ("organization", organization),
                    ("title", title),
                    ("link", link),
                    ("logo", logo),
                    ("posted", posted.clone()),
                ])
            })
            .collect()
    }

    fn sample(&self) -> Vec<Record> {
        let posted = chrono::Utc::now().format("%Y-%m-%d").to_string();
        [
            ("World Bank", "Consultant for Digital Transformation Project", "WB"),
            ("UNDP Bangladesh", "Supply and Installation of IT Equipment", "UNDP"),
            ("Asian Development Bank", "Technical Assistance for Rural Development", "ADB"),
            ("UNICEF", "Education Sector Development Program", "UNICEF"),
        ]
        .into_iter()
        .map(|(org, title, tag)| {
            record_from([
                ("organization", org.to_string()),
                ("title", title.to_string()),
                ("link", "#".to_string()),
                ("logo", format!("https://via.placeholder.com/60x60?text={tag}")),
                ("posted", posted.clone()),
            ])
        })
        .collect()
    }
}
