//! HTTP access with pacing and retries.
//!
//! - **Shared client**: one lazily built reqwest client with connection pooling
//! - **Pacing**: each [`HttpClient`] keeps a minimum gap between its requests
//! - **Retry logic**: transport errors and 429/5xx responses are retried with
//!   exponential backoff
//!
//! [`HttpClient`] also implements [`AssetFetcher`], so the same type serves both
//! the catalog API and the page servers.
//!
//! # Examples
//!
//! ```rust
//! use shuroku::net::HttpClient;
//!
//! # async fn example() -> shuroku::Result<()> {
//! let api = HttpClient::new("mangadex")
//!     .with_rate_limit(1000)
//!     .with_max_retries(3);
//!
//! let json: serde_json::Value = api.get_json("https://api.mangadex.org/ping").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode, header::HeaderMap};
use std::time::{Duration, Instant};

use crate::source::AssetFetcher;

/// Global HTTP client instance.
///
/// - 30-second timeout
/// - 10 idle connections per host
/// - gzip and brotli decoding
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("shuroku/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Keeps a minimum delay between consecutive requests of one client.
///
/// A zero delay disables pacing entirely, which is what the page servers use:
/// their load is bounded by the fetch pool's concurrency instead.
#[derive(Debug)]
pub struct RateLimiter {
    next_slot: Mutex<Option<Instant>>,
    delay: Duration,
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self::new(self.delay.as_millis() as u64)
    }
}

impl RateLimiter {
    /// Creates a limiter enforcing `delay_ms` milliseconds between requests.
    ///
    /// ```rust
    /// use shuroku::net::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(500);
    /// ```
    pub fn new(delay_ms: u64) -> Self {
        Self {
            next_slot: Mutex::new(None),
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Waits until this client may send its next request.
    ///
    /// Slots are reserved under the lock before sleeping, so concurrent callers
    /// queue up one `delay` apart instead of all waking at once.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }

        let wake_at = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };

        let now = Instant::now();
        if wake_at > now {
            tokio::time::sleep(wake_at - now).await;
        }
    }
}

/// HTTP client wrapper with pacing and retry logic.
///
/// Each client carries a label used in error messages and logs, usually the id
/// of the source it talks to.
#[derive(Clone, Debug)]
pub struct HttpClient {
    label: String,
    rate_limiter: RateLimiter,
    max_retries: u32,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a client with a 200ms pacing delay and 3 retries.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rate_limiter: RateLimiter::new(200),
            max_retries: 3,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the minimum delay between requests, in milliseconds.
    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = RateLimiter::new(delay_ms);
        self
    }

    /// Sets the maximum number of retries for failed requests.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Adds a header sent with every request. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Performs a GET request and returns the body.
    ///
    /// 429 and 5xx responses as well as transport errors are retried up to
    /// `max_retries` times with exponential backoff. Other non-success statuses
    /// fail immediately.
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimit`](crate::Error::RateLimit) - Still throttled after all retries
    /// * [`Error::Source`](crate::Error::Source) - Non-success HTTP status
    /// * [`Error::Network`](crate::Error::Network) - Transport failure after all retries
    pub async fn get(&self, url: &str) -> crate::Result<Bytes> {
        let mut attempts = 0;

        loop {
            self.rate_limiter.wait().await;

            let failure = match CLIENT.get(url).headers(self.headers.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.bytes().await?);
                }
                Ok(response) => {
                    let status = response.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !retryable || attempts >= self.max_retries {
                        return Err(self.status_error(&response));
                    }
                    format!("HTTP {}", status)
                }
                Err(e) => {
                    if attempts >= self.max_retries {
                        return Err(e.into());
                    }
                    e.to_string()
                }
            };

            attempts += 1;
            let delay = backoff(attempts);
            tracing::debug!(
                client = %self.label,
                url,
                attempt = attempts,
                error = %failure,
                "retrying request in {:?}",
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn status_error(&self, response: &reqwest::Response) -> crate::Error {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return crate::Error::rate_limit(retry_after);
        }
        crate::Error::source(
            &self.label,
            format!("HTTP {} for {}", response.status(), response.url().path()),
        )
    }

    /// Performs a GET request and deserializes the body as JSON.
    pub async fn get_json<T>(&self, url: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}

/// Upper bound for the wait between two retries.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential retry delay: 1s, 2s, 4s, ... capped at [`MAX_BACKOFF`].
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500_u64.saturating_mul(2_u64.saturating_pow(attempt))).min(MAX_BACKOFF)
}

#[async_trait]
impl AssetFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> crate::Result<Bytes> {
        self.get(url).await
    }
}
