// Minimum-interval rate limiter for capability calls.
//
// Hosted model APIs cap requests per minute. Rather than sleeping inside the
// annotation logic, every call goes through a shared limiter that spaces
// requests at least `interval` apart. `Throttled` applies it to any
// `TextGenerator`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use super::traits::TextGenerator;

/// Enforces a minimum interval between permits. Clones share state.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                last_request: None,
            })),
        }
    }

    pub async fn interval(&self) -> Duration {
        self.inner.lock().await.interval
    }

    /// Wait until a request is allowed, then return.
    ///
    /// The lock is held across the sleep so that concurrent callers queue up
    /// and are released one interval apart.
    pub async fn acquire(&self) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        if let Some(last) = inner.last_request {
            let elapsed = now.duration_since(last);
            if elapsed < inner.interval {
                let sleep_time = inner.interval - elapsed;
                debug!(wait_ms = sleep_time.as_millis() as u64, "Rate limiter waiting");
                tokio::time::sleep(sleep_time).await;
            }
        }

        inner.last_request = Some(Instant::now());
    }
}

/// A generator whose calls are spaced by a `RateLimiter`.
pub struct Throttled<G> {
    inner: G,
    limiter: RateLimiter,
}

impl<G> Throttled<G> {
    pub fn new(inner: G, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for Throttled<G> {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        self.limiter.acquire().await;
        self.inner.complete(prompt, max_output_tokens).await
    }
}
