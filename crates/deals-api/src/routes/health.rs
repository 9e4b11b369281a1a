//! 헬스 체크 endpoint.
//!
//! `/health`는 프로세스가 응답하는지만 봅니다. `/health/ready`는 로그인이
//! 의존하는 자격증명 저장소에 실제로 질의해 보고, 실패하면 503입니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

/// 준비 상태 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct Readiness {
    /// 로그인 요청을 처리할 수 있는지
    pub ready: bool,
    pub version: String,
    pub uptime_secs: i64,
    /// 자격증명 저장소 상태
    pub credential_store: StoreCheck,
    /// 딜/링크 라우트용 DB 설정 여부 (없으면 해당 라우트는 503)
    pub database_configured: bool,
}

/// 자격증명 저장소 확인 결과.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCheck {
    /// "postgres" | "memory"
    pub backend: String,
    pub reachable: bool,
}

/// Liveness.
///
/// GET /health
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness.
///
/// GET /health/ready
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Readiness>) {
    let store = state.authenticator.store();

    let reachable = match store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(backend = store.backend(), error = %e, "Credential store readiness check failed");
            false
        }
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(Readiness {
            ready: reachable,
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
            credential_store: StoreCheck {
                backend: store.backend().to_string(),
                reachable,
            },
            database_configured: state.db_pool.is_some(),
        }),
    )
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(live))
        .route("/ready", get(ready))
}
