//! Fixed-window request limiter keyed by client IP.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use devscope_api::ApiError;
use devscope_core::{Clock, SystemClock};

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `max_requests` per client within each `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_proxy_headers: bool,
    windows: DashMap<Option<IpAddr>, Window>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            trust_proxy_headers: config.trust_proxy_headers,
            windows: DashMap::new(),
            clock,
        }
    }

    pub fn with_system_clock(config: &RateLimitConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Count one request from `client`. Returns false once the client is
    /// over its quota for the current window.
    ///
    /// Requests with no known address share one bucket.
    pub fn check(&self, client: Option<IpAddr>) -> bool {
        let now = self.clock.now();
        let mut entry = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Forget clients whose window has ended.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }
}

/// Client address used as the limiter key.
///
/// The peer address unless `trust_proxy_headers` is set, in which case the
/// first `x-forwarded-for` hop, then `x-real-ip`, then the peer.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<IpAddr> {
    let peer = peer.map(|addr| addr.ip());
    if !trust_proxy_headers {
        return peer;
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .and_then(|s| s.trim().parse().ok())
        .or(peer)
}

/// Middleware rejecting over-quota clients with `429`.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer, limiter.trust_proxy_headers);

    if !limiter.check(client) {
        tracing::warn!(client = ?client, path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::too_many_requests("Too many requests, slow down.").into_response();
    }
    next.run(request).await
}
