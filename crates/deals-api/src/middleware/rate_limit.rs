//! 로그인 rate limiting.
//!
//! Token Bucket 알고리즘으로 클라이언트 IP별 로그인 시도 횟수를 제한합니다.
//! `auth.login_rate_limit_rpm`이 설정된 경우에만 적용됩니다.
//!
//! 클라이언트 IP는 기본적으로 소켓 주소입니다. 전달 헤더는
//! `auth.trust_forwarded_headers`가 켜진 경우에만 사용합니다.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::ApiErrorResponse;
use crate::metrics::record_login_attempt;
use crate::state::AppState;

/// 기본 최대 추적 클라이언트 수.
pub const DEFAULT_MAX_TRACKED_CLIENTS: usize = 10_000;

/// Rate Limiter 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 분당 최대 요청 수
    pub requests_per_minute: u32,
    /// 버스트 허용량 (순간적으로 허용되는 추가 요청)
    pub burst_size: u32,
    /// 버킷 정리 간격
    pub cleanup_interval: Duration,
    /// 동시에 추적하는 최대 클라이언트 수
    pub max_tracked_clients: usize,
    /// 전달 헤더(`X-Forwarded-For`, `X-Real-IP`) 신뢰 여부
    pub trust_forwarded_headers: bool,
}

impl RateLimitConfig {
    /// 분당 요청 수로 생성 (버스트 없음, 전달 헤더 무시).
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute: requests_per_minute.max(1),
            burst_size: 0,
            cleanup_interval: Duration::from_secs(600),
            max_tracked_clients: DEFAULT_MAX_TRACKED_CLIENTS,
            trust_forwarded_headers: false,
        }
    }

    /// 버스트 허용량 설정.
    pub fn with_burst(mut self, burst_size: u32) -> Self {
        self.burst_size = burst_size;
        self
    }

    /// 최대 추적 클라이언트 수 설정.
    pub fn with_max_tracked_clients(mut self, max: usize) -> Self {
        self.max_tracked_clients = max.max(1);
        self
    }

    /// 전달 헤더 신뢰 여부 설정.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    /// 한 토큰이 다시 채워지는 데 걸리는 시간 (초, 올림).
    fn refill_secs(&self) -> u64 {
        60u64.div_ceil(u64::from(self.requests_per_minute)).max(1)
    }
}

/// Token Bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    max_tokens: f64,
    /// 초당 리필되는 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        // 분당 한도 전체를 초기 용량으로 허용
        let max_tokens = config.requests_per_minute as f64 + config.burst_size as f64;

        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate: config.requests_per_minute as f64 / 60.0,
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// 가득 찬 버킷은 새 버킷과 같으므로 버려도 됩니다.
    fn is_full(&mut self) -> bool {
        self.refill();
        self.tokens >= self.max_tokens
    }

    /// 다음 토큰까지 대기 시간 (초).
    fn time_until_next_token(&self) -> f64 {
        if self.tokens >= 1.0 {
            0.0
        } else {
            (1.0 - self.tokens) / self.refill_rate
        }
    }
}

/// IP별 Rate Limiter.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 요청 허용 여부 확인.
    ///
    /// 추적 한도에 도달하면 가득 찬 버킷부터 비웁니다. 그래도 자리가 없으면
    /// 새 클라이언트는 제한된 것으로 처리합니다.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;

        if !buckets.contains_key(&ip) && buckets.len() >= self.config.max_tracked_clients {
            buckets.retain(|_, bucket| !bucket.is_full());

            if buckets.len() >= self.config.max_tracked_clients {
                tracing::warn!(
                    tracked = buckets.len(),
                    "Login rate limiter at capacity, rejecting new client"
                );
                return RateLimitResult::Limited {
                    retry_after: self.config.refill_secs(),
                };
            }
        }

        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(&self.config));

        if bucket.try_acquire() {
            RateLimitResult::Allowed
        } else {
            let retry_after = bucket.time_until_next_token().ceil().max(1.0) as u64;
            RateLimitResult::Limited { retry_after }
        }
    }

    /// 오래된 버킷 정리.
    pub async fn cleanup(&self) {
        let mut buckets = self.buckets.write().await;
        let Some(threshold) = Instant::now().checked_sub(self.config.cleanup_interval) else {
            return;
        };

        buckets.retain(|_, bucket| bucket.last_refill > threshold);
    }

    /// 현재 추적 중인 IP 수.
    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

/// Rate Limit 확인 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// 로그인 rate limiting 미들웨어.
///
/// 한도 초과 시 429와 `Retry-After` 헤더를 반환합니다.
pub async fn login_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.login_limiter.as_ref() else {
        return next.run(request).await;
    };

    let ip = extract_client_ip(&request, limiter.config().trust_forwarded_headers);

    match limiter.check(ip).await {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Limited { retry_after } => {
            record_login_attempt("rate_limited");
            tracing::warn!(client_ip = %ip, retry_after, "Login rate limit exceeded");

            let body = ApiErrorResponse::with_details(
                "RATE_LIMITED",
                "로그인 시도가 너무 많습니다. 잠시 후 다시 시도하세요",
                serde_json::json!({ "retry_after": retry_after }),
            );
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));

            response
        }
    }
}

/// 요청에서 클라이언트 IP 추출.
///
/// `trust_forwarded`가 켜져 있으면 X-Forwarded-For, X-Real-IP 헤더를 먼저 확인합니다.
/// 그 외에는 소켓 주소를 사용하며, 소켓 정보가 없으면 loopback입니다.
pub fn extract_client_ip(request: &Request, trust_forwarded: bool) -> IpAddr {
    if trust_forwarded {
        if let Some(ip) = forwarded_ip(request) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    let headers = request.headers();

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

/// 주기적으로 오래된 버킷을 정리하는 백그라운드 작업.
pub fn spawn_cleanup_task(
    limiter: RateLimiter,
    shutdown: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.config().cleanup_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => limiter.cleanup().await,
            }
        }
    })
}
