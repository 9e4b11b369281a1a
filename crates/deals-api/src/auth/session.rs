//! 세션 토큰 발급 및 검증.
//!
//! 세션은 서버에 저장하지 않습니다. 신원 클레임을 HS256으로 서명한 토큰 자체가
//! 유일한 근거이며, 서명 검증으로만 복원됩니다.
//!
//! 만료 판정은 초 단위입니다. `t`에 발급된 TTL `d` 토큰은 `[t, t+d]` 동안
//! 유효하고 그 이후에는 [`SessionError::Expired`]입니다.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticator::Identity;

/// 세션 토큰 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject - 사용자 ID
    pub sub: Uuid,
    /// 사용자 이름
    pub username: String,
    /// 관리자 여부
    pub is_admin: bool,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
}

impl IdentityClaims {
    /// `now` 시점에 만료되었는지 확인.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// 발급 시각.
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// 세션 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// 서명 불일치 또는 손상된 토큰
    #[error("세션 토큰이 변조되었습니다")]
    Tampered,
    /// 서명은 유효하지만 만료됨
    #[error("세션이 만료되었습니다")]
    Expired,
    /// 토큰 생성 실패
    #[error("세션 토큰 생성 실패: {0}")]
    Encoding(String),
}

impl SessionError {
    /// 메트릭/로그용 사유.
    pub fn reason(&self) -> &'static str {
        match self {
            SessionError::Tampered => "tampered",
            SessionError::Expired => "expired",
            SessionError::Encoding(_) => "encoding",
        }
    }
}

/// 서명 키.
///
/// 서버 시작 시 비밀 키로 한 번 만들어 발급기와 검증기가 공유합니다.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &SecretString) -> Self {
        Self::from_bytes(secret.expose_secret().as_bytes())
    }

    pub fn from_bytes(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 주입된 시각으로 직접 판정
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp", "sub"]
            .iter()
            .map(|c| c.to_string())
            .collect::<HashSet<_>>();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

/// 발급된 세션.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// 서명된 토큰
    pub token: String,
    /// 토큰에 담긴 클레임
    pub claims: IdentityClaims,
}

impl IssuedSession {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

/// 세션 발급기.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    keys: Arc<SessionKeys>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(keys: Arc<SessionKeys>, ttl: Duration) -> Self {
        Self { keys, ttl }
    }

    /// 세션 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 인증된 사용자에게 세션 토큰 발급.
    ///
    /// `jti`가 매번 새로 생성되므로 같은 사용자와 시각이라도 토큰은 다릅니다.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedSession, SessionError> {
        let iat = now.timestamp();
        let claims = IdentityClaims {
            sub: identity.id,
            username: identity.username.clone(),
            is_admin: identity.is_admin,
            iat,
            exp: iat.saturating_add(self.ttl.num_seconds()),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| SessionError::Encoding(e.to_string()))?;

        Ok(IssuedSession { token, claims })
    }
}

/// 세션 검증기.
///
/// (토큰, 키, 시각)의 순수 함수입니다. I/O가 없습니다.
#[derive(Debug, Clone)]
pub struct SessionVerifier {
    keys: Arc<SessionKeys>,
}

impl SessionVerifier {
    pub fn new(keys: Arc<SessionKeys>) -> Self {
        Self { keys }
    }

    /// 토큰 검증.
    ///
    /// 서명을 먼저 확인하고(불일치 → `Tampered`), 그 다음 만료를 확인합니다.
    ///
    /// 만료는 `now`의 Unix 초와 `exp`를 비교합니다. 초 미만은 버리므로
    /// `exp` 정각에서 최대 999ms 지난 시각까지 유효하고, 다음 초부터 `Expired`입니다.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, SessionError> {
        let data = decode::<IdentityClaims>(token, &self.keys.decoding, &self.keys.validation)
            .map_err(|_| SessionError::Tampered)?;

        if data.claims.is_expired_at(now) {
            return Err(SessionError::Expired);
        }

        Ok(data.claims)
    }
}

/// 같은 키를 공유하는 발급기/검증기 쌍 생성.
pub fn session_pair(secret: &SecretString, ttl: Duration) -> (SessionIssuer, SessionVerifier) {
    let keys = Arc::new(SessionKeys::new(secret));
    (
        SessionIssuer::new(Arc::clone(&keys), ttl),
        SessionVerifier::new(keys),
    )
}
