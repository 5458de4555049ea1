// src/ingest/providers/feed.rs
//! Structured-feed source: a JSON news API answering
//! `{"appnews": {"newsitems": [{"title": .., "url": ..}, ..]}}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{MonitoredSource, Origin};
use crate::error::FetchError;
use crate::ingest::providers::fetch_body;
use crate::ingest::types::{LatestItem, SourceAdapter};

#[derive(Debug, Deserialize)]
struct NewsResponse {
    appnews: AppNews,
}

#[derive(Debug, Deserialize)]
struct AppNews {
    #[serde(default)]
    newsitems: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: Option<String>,
    url: Option<String>,
}

pub struct FeedAdapter {
    client: Client,
}

impl FeedAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    async fn fetch_latest(&self, source: &MonitoredSource) -> Result<LatestItem, FetchError> {
        let Origin::Feed {
            url,
            app_id,
            count,
            max_length,
        } = &source.origin
        else {
            return Err(FetchError::Parse(format!(
                "feed adapter cannot fetch {} source '{}'",
                source.origin.kind(),
                source.id
            )));
        };

        let req = self.client.get(url).query(&[
            ("appid", app_id.to_string()),
            ("count", count.to_string()),
            ("maxlength", max_length.to_string()),
        ]);
        let body = fetch_body(req).await?;
        parse_feed(&body, url)
    }

    fn name(&self) -> &'static str {
        "feed"
    }
}

/// First entry of the response; `fallback_link` when it carries no url.
pub fn parse_feed(body: &str, fallback_link: &str) -> Result<LatestItem, FetchError> {
    let rsp: NewsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let first = rsp
        .appnews
        .newsitems
        .into_iter()
        .next()
        .ok_or(FetchError::EmptyResult)?;

    let title = first.title.as_deref().unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return Err(FetchError::EmptyResult);
    }
    let link = first
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| fallback_link.to_string());

    Ok(LatestItem { title, link })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "https://api.example.com/news";

    #[test]
    fn reads_first_news_item() {
        let body = r#"{"appnews":{"appid":2399420,"newsitems":[
            {"gid":"1","title":"Hotfix 0.9.3","url":"https://store.example.com/news/1"},
            {"gid":"0","title":"Hotfix 0.9.2","url":"https://store.example.com/news/0"}
        ]}}"#;
        let item = parse_feed(body, FALLBACK).unwrap();
        assert_eq!(item, LatestItem::new("Hotfix 0.9.3", "https://store.example.com/news/1"));
    }

    #[test]
    fn missing_url_uses_fallback() {
        let body = r#"{"appnews":{"newsitems":[{"title":"Patch"}]}}"#;
        assert_eq!(parse_feed(body, FALLBACK).unwrap().link, FALLBACK);
    }

    #[test]
    fn empty_list_is_empty_result() {
        let body = r#"{"appnews":{"newsitems":[]}}"#;
        assert_eq!(parse_feed(body, FALLBACK), Err(FetchError::EmptyResult));
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        let err = parse_feed(r#"{"unexpected":true}"#, FALLBACK).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
