//! Media fetching with retries, timeout, and proxy fallback
//!
//! The fetch policy is an explicit ordered list of strategies: up to N direct
//! attempts with linearly increasing backoff, then exactly one attempt through
//! the collaborator streaming proxy. Exhausting the whole chain produces a
//! [`FetchFailed`] value — never a panic and never a propagated transport
//! error — which is what isolates one bad asset from the rest of the batch.
//!
//! Successful audio/video payloads are memoized in an in-run cache keyed by
//! URL, so one physical resource referenced from several places is fetched
//! once. The cache belongs to a single [`MediaFetcher`], which belongs to a
//! single export invocation; it is never shared across exports.

use crate::config::{ExportConfig, RetryConfig, TimeoutConfig};
use crate::types::MediaKind;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// A fetch that exhausted every strategy; a plain value, not a raised error
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("fetch failed for {url}: {reason}")]
pub struct FetchFailed {
    /// Original URL of the asset
    pub url: String,
    /// Reason from the last strategy tried
    pub reason: String,
}

/// One step of the fetch policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchStrategy {
    /// Direct request to the original URL; `attempt` is 1-based
    Direct { attempt: u32 },
    /// Single last-resort request through the streaming proxy
    Proxy,
}

/// Fetches one asset at a time under the configured retry/timeout/fallback
/// policy, memoizing audio/video payloads for the life of the export run
pub struct MediaFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
    timeouts: TimeoutConfig,
    proxy_endpoint: Option<String>,
    cache: Mutex<HashMap<String, Bytes>>,
}

impl MediaFetcher {
    /// Create a fetcher for one export run
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            retry: config.retry.clone(),
            timeouts: config.timeouts.clone(),
            proxy_endpoint: config.proxy_endpoint.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch one asset, returning its bytes or a [`FetchFailed`] value
    ///
    /// Never panics and never propagates a transport error past this boundary.
    pub async fn fetch(&self, url: &str, kind: MediaKind) -> Result<Bytes, FetchFailed> {
        if cacheable(kind)
            && let Some(bytes) = self.cache_get(url)
        {
            tracing::debug!(url = %url, "serving asset from in-run cache");
            return Ok(bytes);
        }

        let chain = self.strategy_chain();
        let mut last_reason = "no fetch strategies configured".to_string();

        for (step, strategy) in chain.iter().enumerate() {
            match self.attempt(*strategy, url, kind).await {
                Ok(bytes) => {
                    if step > 0 {
                        tracing::info!(
                            url = %url,
                            step = step + 1,
                            proxied = matches!(strategy, FetchStrategy::Proxy),
                            "fetch succeeded after retry"
                        );
                    }
                    if cacheable(kind) {
                        self.cache_insert(url, bytes.clone());
                    }
                    return Ok(bytes);
                }
                Err(reason) => {
                    tracing::warn!(
                        url = %url,
                        strategy = ?strategy,
                        error = %reason,
                        "fetch attempt failed"
                    );
                    last_reason = reason;

                    // Linear backoff between direct attempts only; the proxy
                    // step runs immediately after the last direct failure
                    if let FetchStrategy::Direct { attempt } = strategy
                        && matches!(chain.get(step + 1), Some(FetchStrategy::Direct { .. }))
                    {
                        tokio::time::sleep(self.retry.backoff_step * *attempt).await;
                    }
                }
            }
        }

        tracing::error!(url = %url, reason = %last_reason, "all fetch strategies exhausted");
        Err(FetchFailed {
            url: url.to_string(),
            reason: last_reason,
        })
    }

    /// The ordered strategy list: direct ×N, then proxy when configured
    fn strategy_chain(&self) -> Vec<FetchStrategy> {
        let mut chain: Vec<FetchStrategy> = (1..=self.retry.max_attempts)
            .map(|attempt| FetchStrategy::Direct { attempt })
            .collect();
        if self.proxy_endpoint.is_some() {
            chain.push(FetchStrategy::Proxy);
        }
        chain
    }

    /// Execute one strategy; any failure is reduced to a reason string
    async fn attempt(
        &self,
        strategy: FetchStrategy,
        url: &str,
        kind: MediaKind,
    ) -> Result<Bytes, String> {
        let target = match strategy {
            FetchStrategy::Direct { .. } => url.to_string(),
            FetchStrategy::Proxy => {
                let endpoint = self
                    .proxy_endpoint
                    .as_deref()
                    .ok_or_else(|| "no proxy endpoint configured".to_string())?;
                let separator = if endpoint.contains('?') { '&' } else { '?' };
                format!("{endpoint}{separator}url={}", urlencoding::encode(url))
            }
        };

        let timeout = match kind {
            MediaKind::Image => self.timeouts.image,
            MediaKind::Video | MediaKind::Audio => self.timeouts.media,
        };

        let response = self
            .client
            .get(&target)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| describe_request_error(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status {status}"));
        }

        response
            .bytes()
            .await
            .map_err(|e| describe_request_error(&e, timeout))
    }

    fn cache_get(&self, url: &str) -> Option<Bytes> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url)
            .cloned()
    }

    fn cache_insert(&self, url: &str, bytes: Bytes) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(url.to_string())
            .or_insert(bytes);
    }
}

/// Only audio/video payloads are memoized; still images are cheap to re-fetch
/// and rarely referenced twice
fn cacheable(kind: MediaKind) -> bool {
    matches!(kind, MediaKind::Video | MediaKind::Audio)
}

fn describe_request_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else {
        error.to_string()
    }
}
