//! HTTP fetch of the documents handed to the extractor.
//!
//! One GET per call: no retries, no backoff, no crawling. A non-success
//! status is a [`PagemarkError::FetchFailure`], never an empty body.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};
use url::Url;

use pagemark_shared::{FetchConfig, PagemarkError, Result};

/// A fetched document, ready for extraction.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final URL after redirects.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    /// Decoded response body.
    pub body: String,
    /// When the response was received.
    pub fetched_at: DateTime<Utc>,
}

/// Thin wrapper around a configured [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PagemarkError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// GET `url` and return its body.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PagemarkError::fetch(
                url.as_str(),
                format!("unsupported scheme: {}", url.scheme()),
            ));
        }

        debug!("sending request");
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| PagemarkError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "non-success status");
            return Err(PagemarkError::fetch(url.as_str(), format!("HTTP {status}")));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| PagemarkError::fetch(url.as_str(), format!("body read failed: {e}")))?;

        info!(
            status = status.as_u16(),
            bytes = body.len(),
            final_url = %final_url,
            "fetched document"
        );

        Ok(FetchedDocument {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
            fetched_at: Utc::now(),
        })
    }
}
