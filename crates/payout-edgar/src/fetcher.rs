//! Throttled, retrying, cache-aware HTTP fetcher.
//!
//! Every request to the filing source goes through [`Fetcher::fetch`]:
//!
//! 1. The content cache is consulted (unless `force_refresh` is set).
//! 2. On a miss, the shared [`RateLimiter`] is awaited before each attempt.
//! 3. `429`, `5xx` and transport failures are retried with exponential
//!    backoff plus random jitter, up to `max_attempts`.
//! 4. With `max_bytes`, the body is streamed and cut off at the budget.
//! 5. The body is written back to the cache and returned.

use futures::StreamExt;
use payout_core::{
    ContentCache, FetcherConfig, PayoutError, Result, bounded_cache_key, cache_key,
};
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::rate_limit::RateLimiter;

/// Per-call fetch options.
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Cache time-to-live; the fetcher default is used when absent.
    pub ttl: Option<Duration>,
    /// Skip the cache read (the result is still written back).
    pub force_refresh: bool,
    /// Stop reading the body after this many bytes.
    pub max_bytes: Option<usize>,
    /// Aborts the throttle wait, the request, the backoff and the cache write.
    pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
    /// Default options: cached, unbounded, not cancellable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Bypasses the cache read.
    #[must_use]
    pub const fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    /// Bounds the body read.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Outcome of a single failed attempt.
enum Failure {
    Retryable {
        reason: String,
        retry_after: Option<Duration>,
    },
    Fatal(PayoutError),
}

impl Failure {
    fn transport(context: &str, error: &reqwest::Error) -> Self {
        Self::Retryable {
            reason: format!("{context}: {error}"),
            retry_after: None,
        }
    }
}

/// HTTP fetcher with a shared throttle and a pluggable content cache.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    cache: Arc<dyn ContentCache>,
    limiter: Arc<RateLimiter>,
    config: FetcherConfig,
}

impl Fetcher {
    /// Creates a fetcher with its own limiter built from `config.min_interval`.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the HTTP client cannot be built.
    pub fn new(config: FetcherConfig, cache: Arc<dyn ContentCache>) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.min_interval));
        Self::with_limiter(config, cache, limiter)
    }

    /// Creates a fetcher that shares an existing limiter.
    ///
    /// Use this when several fetchers talk to the same source, or with
    /// [`RateLimiter::unthrottled`] in tests.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the HTTP client cannot be built.
    pub fn with_limiter(
        config: FetcherConfig,
        cache: Arc<dyn ContentCache>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PayoutError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            cache,
            limiter,
            config,
        })
    }

    /// Fetcher settings.
    #[must_use]
    pub const fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// The content cache backing this fetcher.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn ContentCache> {
        &self.cache
    }

    /// The shared throttle.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches `url` as text.
    ///
    /// # Errors
    /// - [`PayoutError::SourceUnavailable`] once every attempt has failed
    /// - [`PayoutError::Http`] for a non-retryable status (e.g. 404)
    /// - [`PayoutError::Cancelled`] if the token fires first
    #[instrument(skip(self, url, options), fields(url = %url))]
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String> {
        if options.is_cancelled() {
            return Err(PayoutError::Cancelled(url.to_string()));
        }

        let key = match options.max_bytes {
            Some(max_bytes) => bounded_cache_key(url, max_bytes),
            None => cache_key(url),
        };

        if !options.force_refresh {
            match self.cache.get(&key).await {
                Ok(Some(body)) => {
                    debug!("Serving from cache");
                    return Ok(body);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Cache read failed, fetching from source"),
            }
        }

        let body = match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("Fetch cancelled");
                    return Err(PayoutError::Cancelled(url.to_string()));
                }
                result = self.fetch_with_retry(url, options.max_bytes) => result?,
            },
            None => self.fetch_with_retry(url, options.max_bytes).await?,
        };

        if options.is_cancelled() {
            debug!("Fetch cancelled before cache write");
            return Err(PayoutError::Cancelled(url.to_string()));
        }

        let ttl = options.ttl.unwrap_or(self.config.default_ttl);
        if let Err(e) = self.cache.set(&key, &body, ttl).await {
            warn!(error = %e, "Failed to cache response");
        }

        Ok(body)
    }

    async fn fetch_with_retry(&self, url: &str, max_bytes: Option<usize>) -> Result<String> {
        let max_attempts = self.config.max_attempts;
        let mut last_reason = String::from("no attempt made");

        for attempt in 1..=max_attempts {
            self.limiter.wait().await;

            match self.attempt(url, max_bytes).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "Fetched");
                    return Ok(body);
                }
                Err(Failure::Fatal(e)) => return Err(e),
                Err(Failure::Retryable {
                    reason,
                    retry_after,
                }) => {
                    warn!(attempt, max_attempts, reason = %reason, "Retryable fetch failure");
                    last_reason = reason;

                    if attempt < max_attempts {
                        let delay = self.backoff(attempt).max(
                            retry_after
                                .unwrap_or_default()
                                .min(self.config.max_backoff),
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(PayoutError::SourceUnavailable {
            url: url.to_string(),
            attempts: max_attempts,
            reason: last_reason,
        })
    }

    async fn attempt(
        &self,
        url: &str,
        max_bytes: Option<usize>,
    ) -> std::result::Result<String, Failure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Failure::transport("request failed", &e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Failure::Retryable {
                reason: format!("HTTP {}", status.as_u16()),
                retry_after,
            });
        }

        if !status.is_success() {
            return Err(Failure::Fatal(PayoutError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        match max_bytes {
            Some(limit) => read_bounded(response, limit).await,
            None => response
                .text()
                .await
                .map_err(|e| Failure::transport("body read failed", &e)),
        }
    }

    /// Exponential backoff for the retry after `attempt`, plus up to one
    /// base interval of jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .config
            .base_backoff
            .saturating_mul(1 << exponent)
            .min(self.config.max_backoff);

        let base_ms = self.config.base_backoff.as_millis() as u64;
        let jitter = if base_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=base_ms)
        };
        delay + Duration::from_millis(jitter)
    }
}

/// Streams the body until `limit` bytes have arrived, then drops the
/// connection and returns what was read.
async fn read_bounded(
    response: reqwest::Response,
    limit: usize,
) -> std::result::Result<String, Failure> {
    let mut body: Vec<u8> = Vec::with_capacity(limit.min(64 * 1024));
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Failure::transport("body read failed", &e))?;
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!(limit, "Truncated response at byte budget");
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(decode_truncated(body))
}

/// Decodes possibly truncated UTF-8, dropping a multi-byte sequence cut at the end.
fn decode_truncated(mut bytes: Vec<u8>) -> String {
    if let Err(e) = std::str::from_utf8(&bytes)
        && e.error_len().is_none()
    {
        bytes.truncate(e.valid_up_to());
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
