//! 로그인/로그아웃/세션 조회 endpoint.
//!
//! 로그인에 성공하면 세션 토큰을 HTTP-only 쿠키로 설정하고, API 클라이언트를 위해
//! 응답 본문에도 담습니다. 실패 응답은 항상 같은 코드와 메시지입니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::auth::{clear_session_cookie, session_cookie, AuthError, Identity, SessionAuth};
use crate::error::ApiErrorResponse;
use crate::middleware::login_rate_limit;
use crate::state::AppState;

/// 로그인 요청.
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "identifier")]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// 인증된 사용자
    pub user: Identity,
    /// 세션 만료 시각
    pub expires_at: DateTime<Utc>,
    /// 세션 토큰 (쿠키와 동일)
    pub token: String,
}

/// 현재 세션 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

fn set_cookie(response: &mut Response, cookie: String) -> Result<(), Response> {
    let value = HeaderValue::from_str(&cookie).map_err(|e| {
        error!(error = %e, "Invalid Set-Cookie header value");
        internal_error()
    })?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(())
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse::new(
            "INTERNAL_ERROR",
            "요청을 처리하는 중 오류가 발생했습니다",
        )),
    )
        .into_response()
}

/// 로그인.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let identity = match state
        .authenticator
        .authenticate(&request.username, &request.password)
        .await
    {
        Ok(identity) => identity,
        Err(err @ AuthError::InvalidCredentials) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiErrorResponse::new("INVALID_CREDENTIALS", err.to_string())),
            )
                .into_response();
        }
        Err(err @ AuthError::StoreUnavailable) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiErrorResponse::new("AUTH_UNAVAILABLE", err.to_string())),
            )
                .into_response();
        }
    };

    let session = match state.issuer.issue(&identity, state.now()) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, user_id = %identity.id, "Failed to issue session");
            return internal_error();
        }
    };

    let cookie = session_cookie(
        &state.cookie_name,
        &session.token,
        state.issuer.ttl().num_seconds(),
        state.cookie_secure,
    );

    let mut response = Json(LoginResponse {
        expires_at: session.expires_at(),
        user: identity,
        token: session.token,
    })
    .into_response();

    match set_cookie(&mut response, cookie) {
        Ok(()) => response,
        Err(error_response) => error_response,
    }
}

/// 로그아웃.
///
/// POST /api/auth/logout
///
/// 세션은 서버에 없으므로 쿠키만 만료시킵니다. 이미 발급된 토큰은 만료 시각까지 유효합니다.
pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();

    match set_cookie(
        &mut response,
        clear_session_cookie(&state.cookie_name, state.cookie_secure),
    ) {
        Ok(()) => response,
        Err(error_response) => error_response,
    }
}

/// 현재 세션 조회.
///
/// GET /api/auth/session
pub async fn current_session(SessionAuth(claims): SessionAuth) -> Json<SessionResponse> {
    Json(SessionResponse {
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
        user: Identity {
            id: claims.sub,
            username: claims.username,
            is_admin: claims.is_admin,
        },
    })
}

/// 인증 라우터 생성.
///
/// 로그인에만 rate limiting을 적용합니다.
pub fn auth_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/login",
            post(login).route_layer(middleware::from_fn_with_state(
                Arc::clone(state),
                login_rate_limit,
            )),
        )
        .route("/logout", post(logout))
        .route("/session", get(current_session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        CredentialStore, HashParams, InMemoryCredentialStore, PasswordHasher, StoreError,
    };
    use crate::state::create_test_state_with_store;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use deals_core::User;
    use tower::ServiceExt;

    fn router_with(store: Arc<dyn CredentialStore>) -> Router {
        let state = Arc::new(create_test_state_with_store(store));

        Router::new()
            .nest("/api/auth", auth_router(&state))
            .with_state(state)
    }

    fn app() -> Router {
        let hasher = PasswordHasher::new(HashParams::minimal()).unwrap();
        let store = InMemoryCredentialStore::with_users([User::new(
            "admin",
            hasher.hash("admin123").unwrap(),
            true,
        )]);
        router_with(Arc::new(store))
    }

    struct UnreachableStore;

    #[async_trait]
    impl CredentialStore for UnreachableStore {
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn backend(&self) -> &'static str {
            "postgres"
        }
    }

    fn login_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_login_request_debug_redacts_password() {
        let request = LoginRequest {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        };
        let debug = format!("{:?}", request);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("admin123"));
    }

    #[tokio::test]
    async fn test_login_sets_http_only_cookie() {
        let response = app()
            .oneshot(login_request(
                serde_json::json!({"username": "admin", "password": "admin123"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("deals_session="));
        assert!(cookie.contains("HttpOnly"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let login: LoginResponse = serde_json::from_slice(&body).unwrap();
        assert!(login.user.is_admin);
        assert!(cookie.contains(&login.token));
    }

    #[tokio::test]
    async fn test_login_failure_is_generic() {
        let wrong_password = app()
            .oneshot(login_request(
                serde_json::json!({"username": "admin", "password": "wrong"}),
            ))
            .await
            .unwrap();
        let unknown_user = app()
            .oneshot(login_request(
                serde_json::json!({"username": "ghost", "password": "admin123"}),
            ))
            .await
            .unwrap();

        for response in [wrong_password, unknown_user] {
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(response.headers().get(SET_COOKIE).is_none());

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
            assert_eq!(error.code, "INVALID_CREDENTIALS");
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_service_unavailable() {
        let response = router_with(Arc::new(UnreachableStore))
            .oneshot(login_request(
                serde_json::json!({"username": "admin", "password": "admin123"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(SET_COOKIE).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "AUTH_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_session_requires_token() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
