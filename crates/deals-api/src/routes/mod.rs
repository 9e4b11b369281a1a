//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! | 경로 | 접근 수준 |
//! |------|-----------|
//! | `/health`, `/health/ready` | 공개 |
//! | `/metrics` | 공개 |
//! | `/api/auth/login`, `/api/auth/logout` | 공개 (로그인은 rate limit) |
//! | `/api/auth/session` | 세션 |
//! | `/api/deals`, `/api/deals/by-store`, `/api/deals/by-category` | 공개 |
//! | `/api/stores`, `/api/categories` | 공개 |
//! | `/api/links`, `/api/links/{id}` | 세션 |
//! | `/api/admin/dashboard` | 관리자 |

pub mod admin;
pub mod auth;
pub mod deals;
pub mod health;
pub mod links;

pub use admin::{admin_router, DashboardResponse};
pub use auth::{auth_router, LoginRequest, LoginResponse, SessionResponse};
pub use deals::deals_router;
pub use health::{health_router, Readiness, StoreCheck};
pub use links::{links_router, DeleteResponse};

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use deals_core::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::metrics_layer;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 접근 제어는 각 서브 라우터가 `route_layer`로 직접 적용합니다.
pub fn create_api_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/auth", auth_router(state))
        .nest("/api/links", links_router(state))
        .nest("/api/admin", admin_router(state))
        .nest("/api", deals_router())
}

/// CORS 레이어 생성.
///
/// origin 목록이 비어 있으면 개발 모드로 간주하여 모든 origin을 허용합니다.
/// 쿠키 전송(`credentials`)은 origin 목록이 있을 때만 허용합니다.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if parsed.is_empty() {
        if !origins.is_empty() {
            warn!("CORS origins are set but none are valid, allowing any");
        } else {
            warn!("CORS origins not set, allowing any origin (development mode)");
        }
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        layer
            .allow_origin(AllowOrigin::list(parsed))
            .allow_credentials(true)
    }
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 애플리케이션 라우터 생성.
///
/// 메트릭 핸들이 없으면 `/metrics`를 노출하지 않습니다.
pub fn create_app(
    state: Arc<AppState>,
    server: &ServerConfig,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let mut app = create_api_router(&state).with_state(state);

    if let Some(handle) = metrics_handle {
        let metrics_router = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_router);
    }

    app.layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(cors_layer(&server.cors_origins))
}
