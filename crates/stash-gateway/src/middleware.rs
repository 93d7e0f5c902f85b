//! HTTP middleware for authentication, rate limiting, etc.

use crate::auth::{removal_cookie, session_artifact, Principal};
use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use governor::{state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Rate limiter type
pub type KeyedRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, governor::clock::DefaultClock>;

/// Create a rate limiter; zero is treated as one request per second
pub fn create_rate_limiter(requests_per_second: u32) -> Arc<KeyedRateLimiter> {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::keyed(Quota::per_second(rate)))
}

/// Interval between prunes of idle rate limiter entries
pub const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Drop per-client limiter state that has fully replenished, until `shutdown` fires
pub fn spawn_limiter_pruner(
    limiter: Arc<KeyedRateLimiter>,
    every: Duration,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    limiter.retain_recent();
                    limiter.shrink_to_fit();
                    tracing::trace!(clients = limiter.len(), "pruned login limiter");
                }
                _ = shutdown.changed() => return,
            }
        }
    })
}

/// Paths reachable without a session
const PUBLIC_PATHS: &[&str] = &["/login", "/api/auth/login", "/api/auth/logout"];
const PUBLIC_PREFIXES: &[&str] = &["/static/"];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Run the rest of the chain as `principal`. The principal is attached to
/// both the request (for handlers) and the response (for the request log).
async fn run_as(principal: Principal, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Skip auth if disabled
    if !state.config.auth_enabled {
        return run_as(Principal::Anonymous, request, next).await;
    }

    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let artifact = session_artifact(request.headers());
    let error = match artifact.as_deref() {
        None => ApiError::Unauthorized,
        Some(artifact) => match state.auth.validate(artifact, Utc::now()) {
            Ok(principal) => return run_as(principal, request, next).await,
            Err(e) => {
                tracing::debug!(path = %request.uri().path(), reason = %e, "session rejected");
                ApiError::Auth(e)
            }
        },
    };

    let mut response = if accepts_html(request.headers()) {
        Redirect::to("/login").into_response()
    } else {
        error.into_response()
    };

    // A presented artifact that failed is cleared from the browser.
    if artifact.is_some() {
        if let Ok(value) = HeaderValue::from_str(&removal_cookie(state.config.secure_cookies).to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Rate limiting middleware, keyed by client address
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if limiter.check_key(&client).is_err() {
        tracing::warn!(client = %client, path = %request.uri().path(), "rate limit exceeded");
        return Err(ApiError::TooManyRequests);
    }

    Ok(next.run(request).await)
}

/// Request ID middleware - adds x-request-id header
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Request ID extension
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request.extensions().get::<RequestId>().map(|id| id.0.clone());
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    let principal = response
        .extensions()
        .get::<Principal>()
        .map_or_else(|| "-".to_string(), Principal::to_string);

    // Query strings are not logged.
    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        request_id = request_id.as_deref().unwrap_or("-"),
        principal = %principal,
        "Request completed"
    );

    response
}
