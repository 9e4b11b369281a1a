//! 접근 게이트.
//!
//! 요청마다 세션 상태를 판정하고 라우트의 접근 수준과 비교합니다.
//! 인증 실패는 여기서 모두 거부 응답으로 바뀌며 비즈니스 로직으로 전파되지 않습니다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::session::{IdentityClaims, SessionError, SessionVerifier};
use crate::metrics::{record_gate_denial, record_session_rejection};

/// 라우트 접근 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// 누구나 접근 가능
    Public,
    /// 유효한 세션 필요
    Authenticated,
    /// 관리자 세션 필요
    Admin,
}

/// 인가 거부 사유.
///
/// 내부적으로는 구분하지만 사용자 응답은 401/403 두 가지뿐입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// 세션 없음, 만료 또는 변조
    #[error("로그인이 필요합니다")]
    Unauthenticated,
    /// 인증되었지만 권한 부족
    #[error("접근 권한이 없습니다")]
    Forbidden,
}

impl AuthzError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthzError::Unauthenticated => "unauthenticated",
            AuthzError::Forbidden => "forbidden",
        }
    }
}

/// 접근 판정.
///
/// `claims`는 이미 검증된(서명과 만료 확인된) 클레임이어야 합니다.
pub fn authorize(claims: Option<&IdentityClaims>, level: AccessLevel) -> Result<(), AuthzError> {
    match (level, claims) {
        (AccessLevel::Public, _) => Ok(()),
        (_, None) => Err(AuthzError::Unauthenticated),
        (AccessLevel::Authenticated, Some(_)) => Ok(()),
        (AccessLevel::Admin, Some(claims)) if claims.is_admin => Ok(()),
        (AccessLevel::Admin, Some(_)) => Err(AuthzError::Forbidden),
    }
}

/// 요청 단위 세션 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// 토큰 없음
    Missing,
    /// 유효한 세션
    Valid(IdentityClaims),
    /// 서명은 유효하지만 만료됨
    Expired,
    /// 서명 불일치 또는 손상
    Tampered,
}

impl SessionState {
    /// 인바운드 토큰으로 상태 판정.
    ///
    /// 변조는 경고로, 만료는 디버그로 남깁니다. 토큰이 없는 것은 기록하지 않습니다.
    pub fn resolve(token: Option<&str>, verifier: &SessionVerifier, now: DateTime<Utc>) -> Self {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return SessionState::Missing;
        };

        match verifier.verify(token, now) {
            Ok(claims) => SessionState::Valid(claims),
            Err(SessionError::Expired) => {
                record_session_rejection("expired");
                debug!("Session token expired");
                SessionState::Expired
            }
            Err(e) => {
                record_session_rejection("tampered");
                warn!(error = %e, "Rejected tampered session token");
                SessionState::Tampered
            }
        }
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        match self {
            SessionState::Valid(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn into_claims(self) -> Option<IdentityClaims> {
        match self {
            SessionState::Valid(claims) => Some(claims),
            _ => None,
        }
    }

    /// 로그용 상태 이름.
    pub fn reason(&self) -> &'static str {
        match self {
            SessionState::Missing => "missing",
            SessionState::Valid(_) => "valid",
            SessionState::Expired => "expired",
            SessionState::Tampered => "tampered",
        }
    }

    /// 접근 수준 검사. 거부는 메트릭과 로그로 남깁니다.
    pub fn authorize(&self, level: AccessLevel) -> Result<(), AuthzError> {
        authorize(self.claims(), level).inspect_err(|denial| {
            record_gate_denial(denial.reason());
            debug!(
                level = ?level,
                session = self.reason(),
                denial = denial.reason(),
                "Access denied"
            );
        })
    }
}
