//! Source fetchers.
//!
//! A [`Fetcher`] makes one outbound call and hands back unranked
//! [`RawRecord`]s. It does not retry: a failure surfaces as [`FetchError`]
//! and the refresh pipeline keeps the previous snapshot.
//!
//! [`HttpFetcher`] is the built-in implementation. It GETs the configured
//! listing URL and runs the body through [`markup::parse_listing`].
//! Custom sources implement the trait directly:
//!
//! ```rust
//! use async_trait::async_trait;
//! use rankfeed::fetch::{FetchError, Fetcher};
//! use rankfeed::models::RawRecord;
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl Fetcher for Fixed {
//!     fn source(&self) -> &str { "fixed" }
//!
//!     async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
//!         Ok(vec![RawRecord::new("Title", "https://example.com", Some("150 points"))])
//!     }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::SourceConfig;
use crate::markup;
use crate::models::RawRecord;

/// Failure to retrieve the listing from the source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to source failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("source {url} returned HTTP {status}")]
    Status { status: StatusCode, url: String },

    #[error("failed to read source response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A data source that produces raw listing records.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short label for the source, used in logs.
    fn source(&self) -> &str;

    /// Retrieves the current listing. One network call per invocation.
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError>;
}

/// Fetches a listing page over HTTP and parses it.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn source(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: self.url.clone(),
            });
        }

        let body = response.text().await.map_err(FetchError::Body)?;
        Ok(markup::parse_listing(&body))
    }
}
