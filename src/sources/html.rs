// src/sources/html.rs
//! Shared plumbing for HTML-scraping adapters: page download, CSS selector
//! fallback chains, and the generic [`HtmlSource`] wrapper that turns a
//! [`PageParser`] into a [`SourceAdapter`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::record::{clean_text, Record, SOURCE_FIELD};
use crate::sources::types::{SourceAdapter, SourceContext};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Site-specific half of an HTML adapter: where the page lives and how to
/// read listings out of it.
pub trait PageParser: Send + Sync + 'static {
    fn key(&self) -> &'static str;
    fn url(&self) -> &'static str;
    /// Extract records from a downloaded page. Never fails: unmatched markup
    /// yields an empty vec.
    fn parse(&self, doc: &Html, base: &Url) -> Vec<Record>;
    /// Built-in listings served when `sample_fallback` is enabled.
    fn sample(&self) -> Vec<Record> {
        Vec::new()
    }
}

pub struct HtmlSource<P> {
    parser: P,
    client: reqwest::Client,
    url: Url,
    sample_fallback: bool,
}

impl<P: PageParser> HtmlSource<P> {
    pub fn new(parser: P, ctx: &SourceContext) -> Result<Self> {
        let url = parser.url();
        Self::with_url(parser, ctx, url)
    }

    /// Point the adapter at another URL (mirrors, local fixtures).
    pub fn with_url(parser: P, ctx: &SourceContext, url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid url for {}", parser.key()))?;
        Ok(Self {
            parser,
            client: ctx.client.clone(),
            url,
            sample_fallback: ctx.config.sample_fallback,
        })
    }

    fn parse_body(&self, body: &str) -> Vec<Record> {
        let doc = Html::parse_document(body);
        let scraped_at = chrono::Utc::now().to_rfc3339();
        let mut records = self.parser.parse(&doc, &self.url);
        for (i, r) in records.iter_mut().enumerate() {
            stamp(r, i, self.parser.key());
            r.insert("scraped_at".into(), Value::String(scraped_at.clone()));
        }
        records
    }

    fn samples(&self) -> Vec<Record> {
        let mut records = self.parser.sample();
        for (i, r) in records.iter_mut().enumerate() {
            stamp(r, i, self.parser.key());
        }
        records
    }
}

fn stamp(r: &mut Record, index: usize, key: &str) {
    r.insert("id".into(), Value::from(index as u64 + 1));
    r.insert(SOURCE_FIELD.into(), Value::String(key.to_string()));
}

#[async_trait]
impl<P: PageParser> SourceAdapter for HtmlSource<P> {
    async fn fetch(&self) -> Result<Vec<Record>> {
        let key = self.parser.key();
        tracing::debug!(source = key, url = %self.url, "downloading page");

        let body = match fetch_page(&self.client, &self.url).await {
            Ok(b) => b,
            Err(e) if self.sample_fallback => {
                tracing::warn!(source = key, error = ?e, "page failed; serving sample listings");
                return Ok(self.samples());
            }
            Err(e) => return Err(e),
        };

        let records = self.parse_body(&body);
        if records.is_empty() && self.sample_fallback {
            tracing::warn!(source = key, "no listings matched; serving sample listings");
            return Ok(self.samples());
        }
        Ok(records)
    }

    fn name(&self) -> &'static str {
        self.parser.key()
    }
}

/// GET a page with browser-like headers; non-2xx statuses are errors.
pub async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<String> {
    let resp = client
        .get(url.clone())
        .header(ACCEPT, ACCEPT_HTML)
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("GET {url} returned {status}"));
    }
    resp.text().await.context("reading response body")
}

/* ----------------------------
Selector fallback helpers
---------------------------- */

fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!(selector = css, error = ?e, "skipping invalid selector");
            None
        }
    }
}

/// All matches of the first selector in `chain` that matches anything.
pub fn select_any<'a>(scope: ElementRef<'a>, chain: &[&str]) -> Vec<ElementRef<'a>> {
    for css in chain {
        let Some(sel) = compile(css) else { continue };
        let found: Vec<ElementRef<'a>> = scope.select(&sel).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// First element matched by the first matching selector in `chain`.
pub fn first_match<'a>(scope: ElementRef<'a>, chain: &[&str]) -> Option<ElementRef<'a>> {
    chain
        .iter()
        .filter_map(|css| compile(css))
        .find_map(|sel| scope.select(&sel).next())
}

/// Cleaned text content of an element.
pub fn text_of(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Non-empty text pieces of an element, each cleaned, in document order.
/// Splits cells that use `<br>` as a line separator.
pub fn text_lines(el: ElementRef<'_>) -> Vec<String> {
    el.text()
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Text of the first non-empty match across `chain`.
pub fn first_text(scope: ElementRef<'_>, chain: &[&str]) -> Option<String> {
    first_match(scope, chain)
        .map(text_of)
        .filter(|s| !s.is_empty())
}

/// Text of the first `<span>` inside `el`, falling back to the element text.
pub fn span_or_text(el: ElementRef<'_>) -> String {
    first_text(el, &["span"]).unwrap_or_else(|| text_of(el))
}

pub fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve `href` against `base`; unresolvable links are returned as-is.
pub fn absolute_url(base: &Url, href: &str) -> String {
    let href = href.trim();
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
