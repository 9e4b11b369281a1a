//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 우선순위(낮음 → 높음): 기본값 → `DATABASE_URL`/`AUTH_SECRET` →
//! TOML 파일 → `DEALS__` 접두사 환경 변수.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// 세션 서명 키의 최소 길이 (바이트).
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// 기본 세션 유효 기간: 30일.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// 기본 세션 쿠키 이름.
pub const DEFAULT_COOKIE_NAME: &str = "deals_session";

/// 애플리케이션 설정.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 인증/세션 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 허용할 CORS origin 목록 (비어 있으면 모든 origin 허용)
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 문자열.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL. 없으면 DB 기능이 비활성화됩니다.
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// 시작 시 마이그레이션 실행 여부
    #[serde(default)]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
            run_migrations: false,
        }
    }
}

/// 인증 및 세션 설정.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// 세션 토큰 서명 키 (필수)
    #[serde(default)]
    pub session_secret: Option<SecretString>,
    /// 세션 유효 기간 (초)
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Argon2 메모리 비용 (KiB)
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    /// Argon2 반복 횟수
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    /// Argon2 병렬도
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
    /// 세션 쿠키 이름
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 쿠키에 `Secure` 속성 부여 여부
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
    /// IP별 로그인 시도 한도 (분당). 없으면 제한하지 않습니다.
    #[serde(default)]
    pub login_rate_limit_rpm: Option<u32>,
    /// `X-Forwarded-For`/`X-Real-IP`로 클라이언트 IP를 판단할지 여부.
    ///
    /// 헤더를 덮어쓰는 리버스 프록시 뒤에서만 켜야 합니다. 꺼져 있으면 소켓 주소만 사용합니다.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

fn default_session_ttl() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}
fn default_hash_memory() -> u32 {
    19 * 1024
}
fn default_hash_iterations() -> u32 {
    2
}
fn default_hash_parallelism() -> u32 {
    1
}
fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}
fn default_cookie_secure() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            session_ttl_secs: default_session_ttl(),
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
            cookie_name: default_cookie_name(),
            cookie_secure: default_cookie_secure(),
            login_rate_limit_rpm: None,
            trust_forwarded_headers: false,
        }
    }
}

impl AuthConfig {
    /// 서명 키를 반환합니다.
    ///
    /// # Errors
    /// 키가 없거나 [`MIN_SESSION_SECRET_LEN`]보다 짧으면 `CoreError::Config`.
    pub fn session_secret(&self) -> CoreResult<&SecretString> {
        let secret = self.session_secret.as_ref().ok_or_else(|| {
            CoreError::Config(
                "auth.session_secret이 설정되지 않았습니다 (DEALS__AUTH__SESSION_SECRET)"
                    .to_string(),
            )
        })?;

        if secret.expose_secret().len() < MIN_SESSION_SECRET_LEN {
            return Err(CoreError::Config(format!(
                "auth.session_secret은 최소 {}바이트여야 합니다",
                MIN_SESSION_SECRET_LEN
            )));
        }

        Ok(secret)
    }

    /// 세션 유효 기간.
    ///
    /// # Errors
    /// `chrono::Duration`으로 표현할 수 없을 만큼 크면 `CoreError::Config`.
    pub fn session_ttl(&self) -> CoreResult<chrono::Duration> {
        i64::try_from(self.session_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "auth.session_ttl_secs가 너무 큽니다: {}",
                    self.session_ttl_secs
                ))
            })
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드하고 검증합니다.
    ///
    /// 파일이 없어도 에러가 아닙니다. 서명 키 누락은 에러입니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        Self::load_with_prefix(path, "DEALS")
    }

    /// 지정한 환경 변수 접두사로 설정을 로드하고 검증합니다.
    pub fn load_with_prefix<P: AsRef<Path>>(path: P, env_prefix: &str) -> CoreResult<Self> {
        let config = Self::read_with_prefix(path, env_prefix)?;
        config.validate()?;
        Ok(config)
    }

    /// 검증 없이 설정을 읽습니다.
    ///
    /// 서명 키가 필요 없는 CLI 명령이 `[auth]` 해시 파라미터를 얻을 때 사용합니다.
    pub fn read_with_prefix<P: AsRef<Path>>(path: P, env_prefix: &str) -> CoreResult<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?;

        // 관례적인 환경 변수는 가장 낮은 우선순위로 반영
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_default("database.url", url)?;
        }
        if let Ok(secret) = std::env::var("AUTH_SECRET") {
            builder = builder.set_default("auth.session_secret", secret)?;
        }

        let config: AppConfig = builder
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    /// 시작 시 필요한 설정을 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        self.auth.session_secret()?;

        if self.auth.session_ttl_secs == 0 {
            return Err(CoreError::Config(
                "auth.session_ttl_secs는 0보다 커야 합니다".to_string(),
            ));
        }
        self.auth.session_ttl()?;
        if self.auth.hash_iterations == 0 || self.auth.hash_parallelism == 0 {
            return Err(CoreError::Config(
                "auth.hash_iterations와 auth.hash_parallelism은 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(())
    }
}
