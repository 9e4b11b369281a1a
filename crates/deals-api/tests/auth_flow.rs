//! 로그인부터 접근 게이트까지 전체 라우터 통합 테스트.
//!
//! 데이터베이스 없이 메모리 저장소로 구동하므로 게이트를 통과한 DB 라우트는 503입니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use secrecy::SecretString;
use tower::ServiceExt;

use deals_api::auth::{HashParams, InMemoryCredentialStore, PasswordHasher};
use deals_api::routes::LoginResponse;
use deals_api::{create_app, ApiErrorResponse, AppState};
use deals_core::{AppConfig, FixedClock, ServerConfig, User};

const T0: i64 = 1_700_000_000;
const TTL_SECS: u64 = 60;

fn test_config(login_rpm: Option<u32>) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.session_secret = Some(SecretString::from(
        "integration-test-secret-at-least-32-bytes".to_string(),
    ));
    config.auth.session_ttl_secs = TTL_SECS;
    config.auth.hash_memory_kib = 8;
    config.auth.hash_iterations = 1;
    config.auth.hash_parallelism = 1;
    config.auth.cookie_secure = false;
    config.auth.login_rate_limit_rpm = login_rpm;
    config
}

fn seeded_store() -> Arc<InMemoryCredentialStore> {
    let hasher = PasswordHasher::new(HashParams::minimal()).unwrap();
    Arc::new(InMemoryCredentialStore::with_users([
        User::new("admin", hasher.hash("admin123").unwrap(), true),
        User::new("editor", hasher.hash("editor-pass-1").unwrap(), false),
    ]))
}

fn app_at(store: Arc<InMemoryCredentialStore>, now: i64, login_rpm: Option<u32>) -> Router {
    let state = AppState::from_config(&test_config(login_rpm), store, None)
        .unwrap()
        .with_clock(Arc::new(FixedClock::at_timestamp(now)));

    create_app(Arc::new(state), &ServerConfig::default(), None)
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

fn get_with_cookie(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("deals_session={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(login_request(username, password))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body::<LoginResponse>(response).await.token
}

#[tokio::test]
async fn admin_login_sets_cookie_and_reaches_dashboard() {
    let app = app_at(seeded_store(), T0, None);

    let response = app
        .clone()
        .oneshot(login_request("admin", "admin123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains(&format!("Max-Age={TTL_SECS}")));

    let body: LoginResponse = json_body(response).await;
    assert_eq!(body.user.username, "admin");
    assert!(body.user.is_admin);
    assert_eq!(body.expires_at.timestamp(), T0 + TTL_SECS as i64);

    // 관리자 게이트 통과, DB 미설정
    let response = app
        .oneshot(get_with_cookie("/api/admin/dashboard", Some(&body.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn failed_login_is_generic_and_sets_no_cookie() {
    let app = app_at(seeded_store(), T0, None);

    for (username, password) in [("admin", "wrong"), ("nobody", "admin123"), ("", "")] {
        let response = app
            .clone()
            .oneshot(login_request(username, password))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let error: ApiErrorResponse = json_body(response).await;
        assert_eq!(error.code, "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn non_admin_is_forbidden_from_dashboard() {
    let app = app_at(seeded_store(), T0, None);
    let token = login(&app, "editor", "editor-pass-1").await;

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/admin/dashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 일반 세션 라우트는 허용
    let response = app
        .oneshot(get_with_cookie("/api/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_requests_are_unauthenticated() {
    let app = app_at(seeded_store(), T0, None);

    for uri in ["/api/admin/dashboard", "/api/links", "/api/auth/session"] {
        let response = app.clone().oneshot(get_with_cookie(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let error: ApiErrorResponse = json_body(response).await;
        assert_eq!(error.code, "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn tampered_cookie_is_rejected() {
    let app = app_at(seeded_store(), T0, None);
    let token = login(&app, "editor", "editor-pass-1").await;

    // 페이로드를 관리자 토큰의 것으로 바꿔치기
    let admin_token = login(&app, "admin", "admin123").await;
    let mut parts: Vec<&str> = token.split('.').collect();
    let admin_payload = admin_token.split('.').nth(1).unwrap();
    parts[1] = admin_payload;
    let forged = parts.join(".");

    let response = app
        .oneshot(get_with_cookie("/api/admin/dashboard", Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_expires_after_ttl() {
    let store = seeded_store();
    let token = login(&app_at(store.clone(), T0, None), "editor", "editor-pass-1").await;

    // 만료 시각 정각까지는 유효
    let at_expiry = app_at(store.clone(), T0 + TTL_SECS as i64, None);
    let response = at_expiry
        .oneshot(get_with_cookie("/api/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after_expiry = app_at(store, T0 + TTL_SECS as i64 + 1, None);
    let response = after_expiry
        .oneshot(get_with_cookie("/api/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let app = app_at(seeded_store(), T0, None);
    let token = login(&app, "admin", "admin123").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/session")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session: serde_json::Value = json_body(response).await;
    assert_eq!(session["user"]["username"], "admin");
    assert_eq!(session["user"]["is_admin"], true);
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = app_at(seeded_store(), T0, None);

    let response = app
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
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("deals_session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn login_is_rate_limited_per_client() {
    let app = app_at(seeded_store(), T0, Some(2));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(login_request("admin", "wrong"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // 올바른 비밀번호여도 한도를 넘으면 거부
    let response = app
        .clone()
        .oneshot(login_request("admin", "admin123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(header::RETRY_AFTER).is_some());

    // 다른 라우트는 영향 없음
    let response = app
        .oneshot(get_with_cookie("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn login_from(forwarded_for: &str) -> Request<Body> {
    let mut request = login_request("admin", "wrong");
    request.headers_mut().insert(
        "x-forwarded-for",
        header::HeaderValue::from_str(forwarded_for).unwrap(),
    );
    request
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_limit() {
    let app = app_at(seeded_store(), T0, Some(2));

    let mut statuses = Vec::new();
    for i in 0..20 {
        let response = app
            .clone()
            .oneshot(login_from(&format!("10.0.0.{i}")))
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(&statuses[..2], &[StatusCode::UNAUTHORIZED; 2]);
    assert!(statuses[2..]
        .iter()
        .all(|status| *status == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn forwarded_for_is_used_behind_trusted_proxy() {
    let mut config = test_config(Some(1));
    config.auth.trust_forwarded_headers = true;
    let state = AppState::from_config(&config, seeded_store(), None)
        .unwrap()
        .with_clock(Arc::new(FixedClock::at_timestamp(T0)));
    let app = create_app(Arc::new(state), &ServerConfig::default(), None);

    for client in ["203.0.113.1", "203.0.113.2"] {
        let response = app.clone().oneshot(login_from(client)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{client}");
    }

    let response = app.oneshot(login_from("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn invalid_link_is_bad_request() {
    let app = app_at(seeded_store(), T0, None);
    let token = login(&app, "editor", "editor-pass-1").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/links")
                .header(header::COOKIE, format!("deals_session={token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "url": "ftp://example.com" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiErrorResponse = json_body(response).await;
    assert_eq!(error.code, "VALIDATION_ERROR");
}
