//! 관리자 endpoint.

use std::sync::Arc;

use axum::{extract::State, middleware, routing::get, Json, Router};
use deals_core::{Category, DealListing, Store};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{require_admin, AdminAuth};
use crate::error::{db_error, ApiResult};
use crate::repository::{CategoryRepository, DealRepository, StoreRepository};
use crate::state::AppState;

/// 관리자 대시보드 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub links: Vec<DealListing>,
    pub stores: Vec<Store>,
    pub categories: Vec<Category>,
}

/// 관리자 대시보드.
///
/// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminAuth(claims): AdminAuth,
) -> ApiResult<Json<DashboardResponse>> {
    let pool = state.require_db()?;

    let (links, stores, categories) = tokio::try_join!(
        DealRepository::list(pool),
        StoreRepository::list(pool),
        CategoryRepository::list(pool),
    )
    .map_err(db_error)?;

    debug!(
        user = %claims.username,
        links = links.len(),
        stores = stores.len(),
        categories = categories.len(),
        "Dashboard loaded"
    );

    Ok(Json(DashboardResponse {
        links,
        stores,
        categories,
    }))
}

/// 관리자 라우터 생성.
pub fn admin_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(Arc::clone(state), require_admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn get_dashboard(is_admin: Option<bool>) -> StatusCode {
        let state = Arc::new(create_test_state());
        let mut request = Request::builder().uri("/api/admin/dashboard");

        if let Some(is_admin) = is_admin {
            let identity = Identity {
                id: Uuid::new_v4(),
                username: "someone".to_string(),
                is_admin,
            };
            let token = state.issuer.issue(&identity, state.now()).unwrap().token;
            request = request.header("cookie", format!("deals_session={token}"));
        }

        let app = Router::new()
            .nest("/api/admin", admin_router(&state))
            .with_state(state);

        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_dashboard_access_levels() {
        assert_eq!(get_dashboard(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(get_dashboard(Some(false)).await, StatusCode::FORBIDDEN);
        // 관리자는 게이트를 통과하고 DB 미설정으로 503
        assert_eq!(get_dashboard(Some(true)).await, StatusCode::SERVICE_UNAVAILABLE);
    }
}
