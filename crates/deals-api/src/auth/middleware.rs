//! Axum용 세션 인증 추출기 및 미들웨어.
//!
//! 토큰은 세션 쿠키에서 먼저 찾고, 없으면 `Authorization: Bearer` 헤더를 사용합니다.
//!
//! ```rust,ignore
//! async fn create_link(
//!     SessionAuth(claims): SessionAuth,
//!     Json(input): Json<DealInput>,
//! ) -> impl IntoResponse {
//!     format!("Authenticated user: {}", claims.username)
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::gate::{AccessLevel, AuthzError, SessionState};
use super::session::IdentityClaims;
use crate::error::ApiErrorResponse;
use crate::state::AppState;

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthzError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AuthzError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        (status, Json(ApiErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// 요청 헤더에서 세션 토큰 추출 (쿠키 우선).
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

/// `Cookie` 헤더에서 이름이 일치하는 값.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.trim_matches('"').to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// 세션 쿠키 (`Set-Cookie` 값).
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 세션 쿠키 삭제용 `Set-Cookie` 값.
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

/// 요청의 세션 상태.
///
/// 미들웨어가 이미 판정했으면 그 결과를 재사용합니다.
fn resolve_session(parts: &mut Parts, state: &AppState) -> SessionState {
    if let Some(resolved) = parts.extensions.get::<SessionState>() {
        return resolved.clone();
    }

    let token = session_token(&parts.headers, &state.cookie_name);
    let resolved = SessionState::resolve(token.as_deref(), &state.verifier, state.now());
    parts.extensions.insert(resolved.clone());
    resolved
}

fn extract_with_level(
    parts: &mut Parts,
    state: &AppState,
    level: AccessLevel,
) -> Result<IdentityClaims, AuthzError> {
    let session = resolve_session(parts, state);
    session.authorize(level)?;
    session.into_claims().ok_or(AuthzError::Unauthenticated)
}

/// 유효한 세션을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct SessionAuth(pub IdentityClaims);

impl FromRequestParts<Arc<AppState>> for SessionAuth {
    type Rejection = AuthzError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        extract_with_level(parts, state, AccessLevel::Authenticated).map(SessionAuth)
    }
}

/// 관리자 세션을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub IdentityClaims);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AuthzError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        extract_with_level(parts, state, AccessLevel::Admin).map(AdminAuth)
    }
}

async fn require_access(
    state: &AppState,
    level: AccessLevel,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    if let Err(denial) = extract_with_level(&mut parts, state, level) {
        return denial.into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}

/// 라우터 단위로 유효한 세션을 요구하는 미들웨어.
pub async fn require_authenticated(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    require_access(&state, AccessLevel::Authenticated, request, next).await
}

/// 라우터 단위로 관리자 세션을 요구하는 미들웨어.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    require_access(&state, AccessLevel::Admin, request, next).await
}
