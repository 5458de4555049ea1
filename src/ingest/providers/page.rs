// src/ingest/providers/page.rs
//! Markup-scraping source: the newest entry is the first `<h2>`/`<h3>`
//! inside the page's `<main>` region.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::{Client, Url};

use crate::config::{MonitoredSource, Origin};
use crate::error::FetchError;
use crate::ingest::providers::fetch_body;
use crate::ingest::types::{LatestItem, SourceAdapter};
use crate::ingest::visible_text;

pub struct PageAdapter {
    client: Client,
}

impl PageAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for PageAdapter {
    async fn fetch_latest(&self, source: &MonitoredSource) -> Result<LatestItem, FetchError> {
        let Origin::Page { url } = &source.origin else {
            return Err(FetchError::Parse(format!(
                "page adapter cannot fetch {} source '{}'",
                source.origin.kind(),
                source.id
            )));
        };
        let body = fetch_body(self.client.get(url)).await?;
        parse_page(&body, url)
    }

    fn name(&self) -> &'static str {
        "page"
    }
}

/// Extract the latest item from a page body.
///
/// Title: text of the first heading in `<main>`. Link: `href` of the first
/// anchor inside any heading in `<main>`, resolved against `page_url`;
/// `page_url` itself when no heading carries a link.
pub fn parse_page(html: &str, page_url: &str) -> Result<LatestItem, FetchError> {
    static RE_MAIN: OnceCell<Regex> = OnceCell::new();
    static RE_HEADING: OnceCell<Regex> = OnceCell::new();
    static RE_HREF: OnceCell<Regex> = OnceCell::new();
    let re_main = RE_MAIN.get_or_init(|| Regex::new(r"(?is)<main(?:\s[^>]*)?>(.*?)</main\s*>").unwrap());
    let re_heading = RE_HEADING
        .get_or_init(|| Regex::new(r"(?is)<h[23](?:\s[^>]*)?>(.*?)</h[23]\s*>").unwrap());
    let re_href = RE_HREF.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
    });

    let main = re_main
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(FetchError::EmptyResult)?
        .as_str();

    let mut headings = re_heading
        .captures_iter(main)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));

    let first = headings.next().ok_or(FetchError::EmptyResult)?;
    let title = visible_text(first);
    if title.is_empty() {
        return Err(FetchError::EmptyResult);
    }

    let href = std::iter::once(first)
        .chain(headings)
        .find_map(|h| {
            re_href
                .captures(h)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| html_escape::decode_html_entities(m.as_str().trim()).to_string())
        })
        .filter(|h| !h.is_empty());

    let link = match href {
        Some(h) => resolve_link(page_url, &h),
        None => page_url.to_string(),
    };

    Ok(LatestItem { title, link })
}

fn resolve_link(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
