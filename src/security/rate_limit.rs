//! Per-client fixed-window rate limiting for the `/api` tree.
//!
//! Each client key gets a counter and a reset instant. The first request of a
//! window starts it; requests past `max_requests` before the reset are refused
//! with `429`. Window length and cap are fixed at startup.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::http::request::ClientIpSource;
use crate::http::response::json_error;
use crate::lifecycle::shutdown::ShutdownListener;

/// Body of every `429` produced here.
pub const RATE_LIMIT_MESSAGE: &str = "Trop de requêtes depuis cette IP, veuillez réessayer plus tard.";

/// Path prefix under which requests are counted.
const LIMITED_PREFIX: &str = "/api";

struct Window {
    hits: u32,
    reset_at: Instant,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateLimitStatus {
    fn apply_headers(&self, headers: &mut HeaderMap) {
        let reset_secs = self.reset_after.as_secs_f64().ceil() as u64;
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(self.remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(reset_secs));
        if !self.allowed {
            headers.insert("retry-after", HeaderValue::from(reset_secs));
        }
    }
}

/// In-memory hit counters keyed by client.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: config.max_requests,
            window: config.window(),
        }
    }

    /// Count one request for `key`.
    pub fn check(&self, key: &str) -> RateLimitStatus {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            hits: 0,
            reset_at: now + self.window,
        });

        if entry.reset_at <= now {
            entry.hits = 0;
            entry.reset_at = now + self.window;
        }
        entry.hits = entry.hits.saturating_add(1);

        RateLimitStatus {
            allowed: entry.hits <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.hits),
            reset_after: entry.reset_at.saturating_duration_since(now),
        }
    }

    /// Drop windows that have already reset. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, window| window.reset_at > now);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Sweep expired windows once per window length until shutdown.
    pub async fn run_sweeper(self: Arc<Self>, shutdown: ShutdownListener) {
        let mut ticker = tokio::time::interval(self.window.max(Duration::from_secs(1)));
        ticker.tick().await;

        let stopped = shutdown.wait();
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Swept expired rate-limit windows");
                    }
                }
                () = &mut stopped => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    }
}

/// State for [`rate_limit_middleware`].
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub client_ip: ClientIpSource,
}

fn is_limited_path(path: &str) -> bool {
    path == LIMITED_PREFIX
        || path
            .strip_prefix(LIMITED_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_limited_path(request.uri().path()) {
        return next.run(request).await;
    }

    let key = state.client_ip.key(&request);
    let status = state.limiter.check(&key);

    let mut response = if status.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        json_error(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE)
    };
    status.apply_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max_requests,
        })
    }

    #[tokio::test]
    async fn refuses_after_cap_within_window() {
        let limiter = limiter(3, 60_000);

        for expected_remaining in [2, 1, 0] {
            let status = limiter.check("198.51.100.1");
            assert!(status.allowed);
            assert_eq!(status.remaining, expected_remaining);
        }

        let status = limiter.check("198.51.100.1");
        assert!(!status.allowed);
        assert_eq!(status.remaining, 0);
        assert!(status.reset_after <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn clients_are_counted_separately() {
        let limiter = limiter(1, 60_000);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_expiry() {
        let limiter = limiter(1, 1_000);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert!(limiter.check("a").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_windows() {
        let limiter = limiter(5, 1_000);
        limiter.check("old");
        tokio::time::advance(Duration::from_millis(600)).await;
        limiter.check("fresh");
        tokio::time::advance(Duration::from_millis(500)).await;

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn only_api_tree_is_limited() {
        assert!(is_limited_path("/api"));
        assert!(is_limited_path("/api/"));
        assert!(is_limited_path("/api/stats/daily"));
        assert!(!is_limited_path("/"));
        assert!(!is_limited_path("/apix"));
        assert!(!is_limited_path("/health"));
    }

    #[test]
    fn limited_status_sets_retry_after() {
        let mut headers = HeaderMap::new();
        RateLimitStatus {
            allowed: false,
            limit: 100,
            remaining: 0,
            reset_after: Duration::from_millis(1_500),
        }
        .apply_headers(&mut headers);

        assert_eq!(headers["x-ratelimit-limit"], "100");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert_eq!(headers["retry-after"], "2");
    }
}
