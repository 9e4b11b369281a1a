//! 딜 목록 사이트 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - 자격증명 로그인과 서명된 무상태 세션
//! - 접근 수준(공개/세션/관리자) 기반 라우트 보호
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증, 세션, 접근 게이트
//! - [`repository`]: 딜/스토어/카테고리 데이터베이스 접근
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{
    authorize, AccessLevel, AdminAuth, AuthError, Authenticator, AuthzError, Identity,
    IdentityClaims, SessionAuth, SessionError, SessionIssuer, SessionState, SessionVerifier,
};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::{create_api_router, create_app};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::{create_test_state, create_test_state_with_store};
