//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 서버 시작 시 한 번 만들어 `Arc`로 공유합니다. 세션은 서버에 저장하지 않으므로
//! 요청 간 공유되는 가변 상태는 로그인 rate limiter 버킷뿐입니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use deals_core::{AppConfig, Clock, CoreError, CoreResult, SystemClock};
use sqlx::PgPool;

use crate::auth::{
    session_pair, Authenticator, CredentialStore, HashParams, PasswordHasher, SessionIssuer,
    SessionVerifier,
};
use crate::error::{database_unavailable, ApiError};
use crate::middleware::{RateLimitConfig, RateLimiter};

/// 애플리케이션 공유 상태.
pub struct AppState {
    /// 데이터베이스 연결 풀 (미설정 시 DB 기반 라우트는 503)
    pub db_pool: Option<PgPool>,

    /// 자격증명 검증기
    pub authenticator: Authenticator,

    /// 세션 토큰 발급기
    pub issuer: SessionIssuer,

    /// 세션 토큰 검증기
    pub verifier: SessionVerifier,

    /// 현재 시각 제공자
    pub clock: Arc<dyn Clock>,

    /// 세션 쿠키 이름
    pub cookie_name: String,

    /// 세션 쿠키 `Secure` 속성
    pub cookie_secure: bool,

    /// 로그인 rate limiter (미설정 시 비활성)
    pub login_limiter: Option<RateLimiter>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정으로 상태 생성.
    ///
    /// 세션 비밀 키가 없거나 해시 파라미터가 잘못되면 설정 에러입니다.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn CredentialStore>,
        db_pool: Option<PgPool>,
    ) -> CoreResult<Self> {
        let auth = &config.auth;

        let hasher = PasswordHasher::new(HashParams::from_config(auth))
            .map_err(|e| CoreError::Config(e.to_string()))?;
        let authenticator =
            Authenticator::new(store, hasher).map_err(|e| CoreError::Config(e.to_string()))?;
        let (issuer, verifier) = session_pair(auth.session_secret()?, auth.session_ttl()?);

        let login_limiter = auth.login_rate_limit_rpm.map(|rpm| {
            RateLimiter::new(
                RateLimitConfig::per_minute(rpm)
                    .trust_forwarded_headers(auth.trust_forwarded_headers),
            )
        });

        Ok(Self {
            db_pool,
            authenticator,
            issuer,
            verifier,
            clock: Arc::new(SystemClock),
            cookie_name: auth.cookie_name.clone(),
            cookie_secure: auth.cookie_secure,
            login_limiter,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 시계 교체 (테스트에서 시간 고정).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 현재 시각.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 데이터베이스 풀 (미설정 시 503).
    pub fn require_db(&self) -> Result<&PgPool, ApiError> {
        self.db_pool.as_ref().ok_or_else(database_unavailable)
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}

/// 테스트용 AppState 생성.
///
/// 빈 메모리 저장소, 최소 해시 비용, 고정 비밀 키를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    create_test_state_with_store(Arc::new(crate::auth::InMemoryCredentialStore::new()))
}

/// 주어진 저장소로 테스트용 AppState 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with_store(store: Arc<dyn CredentialStore>) -> AppState {
    use secrecy::SecretString;

    let mut config = AppConfig::default();
    config.auth.session_secret = Some(SecretString::from(
        "test-session-secret-with-at-least-32-bytes".to_string(),
    ));
    config.auth.hash_memory_kib = 8;
    config.auth.hash_iterations = 1;
    config.auth.hash_parallelism = 1;
    config.auth.cookie_secure = false;

    match AppState::from_config(&config, store, None) {
        Ok(state) => state,
        Err(e) => panic!("test state: {}", e),
    }
}
