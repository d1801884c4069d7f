//! Per-IP rate limiting for auth endpoints
//!
//! Fixed one-minute windows keyed by client IP, counted in-process. Auth
//! endpoints are the only brute-forceable surface, so only they are wrapped.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

const WINDOW_SECS: i64 = 60;

#[derive(Debug)]
struct Window {
    started_at: i64,
    count: u32,
}

/// In-process fixed-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
        }
    }

    /// Record a hit for the key; returns false once the window is exhausted
    pub fn check(&self, key: &str, now: i64) -> bool {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now - entry.started_at >= WINDOW_SECS {
            entry.started_at = now;
            entry.count = 0;
        }

        entry.count += 1;
        entry.count <= self.limit
    }
}

/// Shared rate limit state for middleware
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
}

/// Rate limiting middleware keyed by client IP
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();
    let now = chrono::Utc::now().timestamp();

    if !state.limiter.check(&key, now) {
        tracing::warn!(ip = %key, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "too_many_requests",
                "code": "RATE_LIMITED",
                "message": "Too many requests, please try again later."
            })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.check("1.2.3.4", 0));
        assert!(limiter.check("1.2.3.4", 1));
        assert!(limiter.check("1.2.3.4", 2));
        assert!(!limiter.check("1.2.3.4", 3));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check("1.2.3.4", 0));
        assert!(!limiter.check("1.2.3.4", 30));
        assert!(limiter.check("1.2.3.4", 60));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check("1.2.3.4", 0));
        assert!(limiter.check("5.6.7.8", 0));
        assert!(!limiter.check("1.2.3.4", 1));
    }
}
