//! Transport seam for sitemap retrieval.
//!
//! The fetcher only needs "give me the bytes at this URL, or fail". Anything
//! implementing [`Transport`] can stand in for HTTP, which is how the tests
//! serve sitemaps from memory.

use async_trait::async_trait;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{LedgerError, Result};

/// Retrieves raw documents by URL. A single attempt is made per call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP(S) transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the configured user agent and timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| LedgerError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_err = |reason: String| LedgerError::Fetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP status {status}")));
        }

        let body = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
        debug!(url, bytes = body.len(), "fetched document");
        Ok(body.to_vec())
    }
}
