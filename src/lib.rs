//! Resilient client for a remote scraping and extraction service.
//!
//! Five operations are exposed on [`AcquisitionClient`]: scrape, map,
//! extract, search and batch scrape. Each returns a plain result value with
//! a `success` flag; expected failures never surface as `Err` or panics.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod map;
pub mod poller;
pub mod retry;
pub mod scrape;
pub mod search;
pub mod server;
pub mod transport;
pub mod types;

pub use config::ClientConfig;
pub use error::{AcquireError, ErrorKind};
pub use types::*;

use crate::retry::RetryPolicy;
use crate::transport::Transport;
use serde::de::DeserializeOwned;

#[derive(Clone, Debug)]
pub struct AcquisitionClient {
    config: ClientConfig,
    transport: Transport,
}

impl AcquisitionClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self::with_http_client(config, http_client))
    }

    pub fn with_http_client(config: ClientConfig, http_client: reqwest::Client) -> Self {
        let transport = Transport::new(http_client, &config);
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn retry_policy(&self, max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, self.config.retry_base_delay)
    }

    pub async fn scrape(&self, url: &str, options: &ScrapeOptions) -> ScrapeResult {
        scrape::scrape_url(self, url, options).await
    }

    pub async fn map(&self, url: &str, options: &MapOptions) -> MapResult {
        map::map_site(self, url, options).await
    }

    pub async fn extract<T: DeserializeOwned>(&self, request: &ExtractRequest) -> ExtractResult<T> {
        extract::extract(self, request).await
    }

    pub async fn search(&self, query: &str, options: &SearchOptions) -> SearchResult {
        search::search_web(self, query, options).await
    }

    pub async fn batch_scrape(
        &self,
        urls: &[String],
        options: &ScrapeOptions,
        concurrency: usize,
    ) -> BatchResult {
        batch::batch_scrape(self, urls, options, concurrency).await
    }
}
