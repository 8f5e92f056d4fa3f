// src/sources/providers/pksf.rs
use reqwest::Url;
use scraper::Html;

use crate::record::{record_from, Record};
use crate::sources::html::{absolute_url, attr, first_match, first_text, select_any, text_of, PageParser};

const MAX_ITEMS: usize = 10;

/// Tender posts in PKSF's "tender" blog category.
pub struct Pksf;

impl PageParser for Pksf {
    fn key(&self) -> &'static str {
        "pksf"
    }

    fn url(&self) -> &'static str {
        "https://pksf.org.bd/category/tender/"
    }

    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record> {
        let Some(main) = first_match(doc.root_element(), &["#main-content", ".content-area", "main"])
        else {
            return Vec::new();
        };

        select_any(main, &[".wgl_col-4.item", ".post", ".tender-item", "article"])
            .into_iter()
            .take(MAX_ITEMS)
            .enumerate()
            .map(|(i, post)| {
                let date = first_text(post, &[".post_date", ".date", ".published"])
                    .unwrap_or_else(|| chrono::Utc::now().format("%d %b %Y").to_string());

                let anchor = first_match(
                    post,
                    &["h3.blog-post_title a", "h2 a", "h3 a", ".entry-title a", "a"],
                );
                let title = anchor
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("Tender {}", i + 1));
                let link = anchor
                    .and_then(|a| attr(a, "href"))
                    .map(|h| absolute_url(base, &h))
                    .unwrap_or_else(|| "#".to_string());

                let views = first_text(post, &[".post_views .described", ".views", ".view-count"])
                    .unwrap_or_default();
                let likes = first_text(post, &[".sl-count", ".likes", ".like-count"]).unwrap_or_default();
                let author = first_text(post, &[".post_author a", ".author a", ".byline a"])
                    .unwrap_or_else(|| "PKSF".to_string());

                record_from([
                    ("date", date),
                    ("title", title),
                    ("link", link),
                    ("views", views),
                    ("likes", likes),
                    ("author", author),
                ])
            })
            .collect()
    }

    fn sample(&self) -> Vec<Record> {
        [
            ("15 Dec 2024", "Procurement of Office Equipment", "234", "12"),
            ("16 Dec 2024", "Consultancy Services for Impact Assessment", "156", "8"),
            ("17 Dec 2024", "Construction of Training Center", "189", "15"),
        ]
        .into_iter()
        .map(|(date, title, views, likes)| {
            record_from([
                ("date", date),
                ("title", title),
                ("link", "#"),
                ("views", views),
                ("likes", likes),
                ("author", "PKSF"),
            ])
        })
        .collect()
    }
}
