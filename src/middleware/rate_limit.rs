use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::{broadcast, Mutex};

use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u64,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u64,
    entries: Arc<Mutex<HashMap<IpAddr, WindowEntry>>>,
}

#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: u64,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: u64) -> Self {
        Self::with_window(Duration::from_secs(window_secs), max_requests)
    }

    pub fn with_window(window: Duration, max_requests: u64) -> Self {
        Self {
            window,
            max_requests,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let now = Instant::now();
        let mut map = self.entries.lock().await;

        let entry = map.entry(ip).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        let remaining = self.max_requests.saturating_sub(entry.count);
        let reset_after = self
            .window
            .saturating_sub(now.duration_since(entry.window_start));
        let reset_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(reset_after)
            .as_secs();

        RateLimitResult {
            allowed,
            limit: self.max_requests,
            remaining,
            reset_at,
        }
    }

    /// Drop clients idle for more than two windows.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut map = self.entries.lock().await;
        let before = map.len();
        map.retain(|_, value| now.duration_since(value.window_start) <= self.window * 2);
        before - map.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub window_secs: u64,
}

impl RateLimitState {
    pub fn new(window_secs: u64, max_requests: u64) -> Self {
        Self {
            limiter: RateLimiter::new(window_secs, max_requests),
            window_secs,
        }
    }
}

/// Applied to the `/api` router only; health probes are never limited.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(req.headers(), state.config().trust_proxy);
    let result = state.rate_limit().limiter.check(ip).await;

    if !result.allowed {
        tracing::warn!(%ip, limit = result.limit, "Rate limit exceeded");
        let mut response = AppError::too_many_requests("Too many requests").into_response();
        apply_rate_limit_headers(&mut response, &result);
        if let Ok(v) = HeaderValue::from_str(&state.rate_limit().window_secs.to_string()) {
            response.headers_mut().insert("retry-after", v);
        }
        return response;
    }

    let mut response = next.run(req).await;
    apply_rate_limit_headers(&mut response, &result);
    response
}

fn apply_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    for (name, value) in [
        ("ratelimit-limit", result.limit),
        ("ratelimit-remaining", result.remaining),
        ("ratelimit-reset", result.reset_at),
    ] {
        if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
            headers.insert(name, v);
        }
    }
}

pub fn extract_client_ip(headers: &HeaderMap, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<IpAddr>().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_cleanup_loop(
    state: Arc<RateLimitState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(300));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = state.limiter.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "Pruned idle rate limit entries");
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}
