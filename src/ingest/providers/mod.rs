// src/ingest/providers/mod.rs
pub mod feed;
pub mod page;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, RequestBuilder};

use crate::config::{MonitoredSource, Origin};
use crate::error::FetchError;
use crate::ingest::types::{LatestItem, SourceAdapter};

pub use feed::FeedAdapter;
pub use page::PageAdapter;

const USER_AGENT: &str = concat!("source-watch/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client; `timeout` bounds every fetch end to end.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")
}

/// Send a request and return the body of a 2xx response.
pub(crate) async fn fetch_body(req: RequestBuilder) -> Result<String, FetchError> {
    let rsp = req.send().await?;
    let status = rsp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(rsp.text().await?)
}

/// Production adapter: picks the page or feed variant by the source's origin.
pub struct HttpSourceAdapter {
    page: PageAdapter,
    feed: FeedAdapter,
}

impl HttpSourceAdapter {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            page: PageAdapter::new(client.clone()),
            feed: FeedAdapter::new(client),
        }
    }
}

#[async_trait]
impl SourceAdapter for HttpSourceAdapter {
    async fn fetch_latest(&self, source: &MonitoredSource) -> Result<LatestItem, FetchError> {
        let t0 = Instant::now();
        let out = match source.origin {
            Origin::Page { .. } => self.page.fetch_latest(source).await,
            Origin::Feed { .. } => self.feed.fetch_latest(source).await,
        };
        histogram!("watch_fetch_ms", "source" => source.id.clone())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
