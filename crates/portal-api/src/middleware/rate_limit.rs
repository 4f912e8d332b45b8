// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Fixed-window rate limiting middleware.
//!
//! Requests are counted per `(client address, user id)` key, with
//! unauthenticated callers counted under `"anonymous"`. Each key gets a
//! window that opens on its first request; once `max_requests` have been
//! seen inside the window further requests are rejected until the window
//! expires. There is no Retry-After guarantee.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use portal_config::RateLimitConfig;
use tower::{Layer, Service};

use crate::auth::{AuthContext, ANONYMOUS_USER};
use crate::error::ApiError;

/// Entry count above which expired windows are purged inline.
const PURGE_THRESHOLD: usize = 10_000;

// =============================================================================
// Window
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Rate limiter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    /// Client address.
    pub ip: IpAddr,
    /// Resolved user id or `"anonymous"`.
    pub user: String,
}

impl RateKey {
    /// Creates a key. A missing address is counted as `0.0.0.0`.
    pub fn new(ip: Option<IpAddr>, user: impl Into<String>) -> Self {
        Self {
            ip: ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            user: user.into(),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// Request is rejected.
    Limited {
        /// Window length in seconds.
        window_secs: u64,
    },
}

impl RateLimitDecision {
    /// Returns `true` if the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

// =============================================================================
// RateLimiter
// =============================================================================

/// Process-wide fixed-window counters.
///
/// One instance is created at startup and shared through the application
/// state. Tests build a fresh instance per case.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    windows: DashMap<RateKey, Window>,
}

impl RateLimiter {
    /// Creates a rate limiter from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: config.window(),
            windows: DashMap::new(),
        }
    }

    /// Creates a disabled rate limiter.
    pub fn disabled() -> Self {
        Self::new(&RateLimitConfig {
            enabled: false,
            ..Default::default()
        })
    }

    /// Returns the window length in seconds.
    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Counts a request for `key` and decides whether it may proceed.
    pub fn check(&self, key: &RateKey) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Like [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, key: &RateKey, now: Instant) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision::Allowed {
                remaining: self.max_requests,
            };
        }

        if self.windows.len() > PURGE_THRESHOLD {
            self.purge_expired_at(now);
        }

        let mut entry = self.windows.entry(key.clone()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            RateLimitDecision::Limited {
                window_secs: self.window_secs(),
            }
        } else {
            entry.count += 1;
            RateLimitDecision::Allowed {
                remaining: self.max_requests - entry.count,
            }
        }
    }

    /// Removes windows that have expired.
    pub fn purge_expired(&self) {
        self.purge_expired_at(Instant::now());
    }

    fn purge_expired_at(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }

    /// Returns the number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

// =============================================================================
// RateLimitLayer
// =============================================================================

/// Layer for rate limiting.
///
/// Must sit inside [`AuthLayer`](super::AuthLayer) so the user id is known.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
}

impl RateLimitLayer {
    /// Creates a layer over a shared limiter.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// Returns the shared limiter.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

// =============================================================================
// RateLimitMiddleware
// =============================================================================

/// Middleware for rate limiting.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let client_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());
            let user = req
                .extensions()
                .get::<AuthContext>()
                .map(|ctx| ctx.user_id.clone())
                .unwrap_or_else(|| ANONYMOUS_USER.to_string());

            let key = RateKey::new(client_ip, user);
            match limiter.check(&key) {
                RateLimitDecision::Allowed { .. } => inner.call(req).await,
                RateLimitDecision::Limited { window_secs } => {
                    tracing::debug!(
                        client_ip = %key.ip,
                        user_id = %key.user,
                        path = %req.uri().path(),
                        "Rate limit exceeded"
                    );
                    Ok(ApiError::rate_limited(window_secs).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled: true,
            max_requests,
            window_secs: 60,
        })
    }

    fn key(ip: &str, user: &str) -> RateKey {
        RateKey::new(Some(ip.parse().unwrap()), user)
    }

    #[test]
    fn test_rate_limiter_disabled() {
        let limiter = RateLimiter::disabled();
        let key = key("10.0.0.1", "anonymous");
        for _ in 0..1000 {
            assert!(limiter.check(&key).is_allowed());
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_cap_within_window() {
        let limiter = limiter(3);
        let key = key("10.0.0.1", "u1");

        assert_eq!(limiter.check(&key), RateLimitDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.check(&key), RateLimitDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check(&key), RateLimitDecision::Allowed { remaining: 0 });
        assert_eq!(limiter.check(&key), RateLimitDecision::Limited { window_secs: 60 });
    }

    #[test]
    fn test_keys_are_isolated() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.check_at(&key("10.0.0.1", "u1"), now).is_allowed());
        assert!(!limiter.check_at(&key("10.0.0.1", "u1"), now).is_allowed());

        assert!(limiter.check_at(&key("10.0.0.1", "u2"), now).is_allowed());
        assert!(limiter.check_at(&key("10.0.0.2", "u1"), now).is_allowed());
        assert!(limiter.check_at(&key("10.0.0.1", "anonymous"), now).is_allowed());
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(2);
        let key = key("10.0.0.1", "u1");
        let start = Instant::now();

        assert!(limiter.check_at(&key, start).is_allowed());
        assert!(limiter.check_at(&key, start + Duration::from_secs(30)).is_allowed());
        assert!(!limiter.check_at(&key, start + Duration::from_secs(59)).is_allowed());
        assert!(limiter.check_at(&key, start + Duration::from_secs(60)).is_allowed());
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let limiter = limiter(1);
        let key = key("10.0.0.1", "u1");
        let start = Instant::now();

        assert!(limiter.check_at(&key, start).is_allowed());
        for s in 1..60 {
            assert!(!limiter.check_at(&key, start + Duration::from_secs(s)).is_allowed());
        }
        assert!(limiter.check_at(&key, start + Duration::from_secs(60)).is_allowed());
    }

    #[test]
    fn test_purge_expired() {
        let limiter = limiter(5);
        let start = Instant::now();
        limiter.check_at(&key("10.0.0.1", "u1"), start);
        limiter.check_at(&key("10.0.0.2", "u2"), start);
        assert_eq!(limiter.tracked_keys(), 2);

        limiter.purge_expired_at(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_missing_ip_key() {
        let key = RateKey::new(None, "anonymous");
        assert_eq!(key.ip, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
