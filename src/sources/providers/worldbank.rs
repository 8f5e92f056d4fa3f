// src/sources/providers/worldbank.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{first_match, select_any, text_of, PageParser};

const MAX_ITEMS: usize = 20;

/// World Bank projects list for Bangladesh.
///
/// The live page renders its table client-side, so a plain download often
/// matches nothing; enable `sample_fallback` to serve reference listings then.
pub struct WorldBank;

impl PageParser for WorldBank {
    fn key(&self) -> &'static str {
        "worldbank"
    }

    fn url(&self) -> &'static str {
        "https://projects.worldbank.org/en/projects-operations/projects-list?os=0&countryshortname_exact=Bangladesh"
    }

    fn parse(&self, doc: &Html, _base: &Url) -> Vec<Record> {
        select_any(
            doc.root_element(),
            &["table.project-operation-tab-table tbody tr", "tbody tr"],
        )
        .into_iter()
        .take(MAX_ITEMS)
        .filter_map(|row| {
            let cells = select_any(row, &["td"]);
            if cells.len() < 8 {
                return None;
            }
            let title = first_match(cells[0], &["a"])
                .map(text_of)
                .unwrap_or_else(|| text_of(cells[0]));
            Some(record_from([
                ("title", title),
                ("country", text_of(cells[1])),
                ("project_id", text_of(cells[2])),
                ("amount", text_of(cells[3])),
                ("status", text_of(cells[4])),
                ("approval_date", text_of(cells[5])),
                ("last_updated", text_of(cells[6])),
                ("last_stage", text_of(cells[7])),
            ]))
        })
        .collect()
    }

    fn sample(&self) -> Vec<Record> {
        [
            ("Bangladesh Road Safety Project", "P171023", "$300.00 million", "28-Jun-2023", "31-Jan-2025"),
            ("Urban Health, Nutrition and Population Project", "P177561", "$250.00 million", "28-Mar-2024", "10-Feb-2025"),
            ("Bangladesh Environmental Sustainability and Transformation Project", "P180514", "$325.00 million", "20-Jun-2024", "05-Feb-2025"),
        ]
        .into_iter()
        .map(|(title, id, amount, approved, updated)| {
            record_from([
                ("title", title),
                ("country", "Bangladesh"),
                ("project_id", id),
                ("amount", amount),
                ("status", "Active"),
                ("approval_date", approved),
                ("last_updated", updated),
                ("last_stage", "Implementation"),
            ])
        })
        .collect()
    }
}
