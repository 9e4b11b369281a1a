//! 딜(링크) 관리 endpoint.
//!
//! 모든 라우트는 유효한 세션을 요구합니다. 입력 검증은 데이터베이스 접근보다 먼저
//! 수행하므로 잘못된 요청은 항상 400입니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, put},
    Json, Router,
};
use deals_core::DealListing;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{require_authenticated, SessionAuth};
use crate::error::{db_error, invalid_input, not_found, validation_error, ApiError, ApiResult};
use crate::repository::{DealInput, DealRepository};
use crate::state::AppState;

/// 삭제 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

fn link_not_found() -> ApiError {
    not_found("LINK_NOT_FOUND", "링크를 찾을 수 없습니다")
}

/// 쓰기 실패 변환. 존재하지 않는 스토어/카테고리 참조는 입력 오류로 봅니다.
fn write_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return validation_error(
                "존재하지 않는 스토어 또는 카테고리입니다",
                serde_json::json!({ "fields": ["store_id", "category_id"] }),
            );
        }
    }
    db_error(err)
}

async fn load_listing(pool: &PgPool, id: Uuid) -> ApiResult<DealListing> {
    DealRepository::find_by_id(pool, id)
        .await
        .map_err(db_error)?
        .ok_or_else(link_not_found)
}

/// 링크 목록.
///
/// GET /api/links
pub async fn list_links(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<DealListing>>> {
    let pool = state.require_db()?;
    let links = DealRepository::list(pool).await.map_err(db_error)?;
    Ok(Json(links))
}

/// 링크 생성.
///
/// POST /api/links
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    SessionAuth(claims): SessionAuth,
    Json(input): Json<DealInput>,
) -> ApiResult<(StatusCode, Json<DealListing>)> {
    input.validate().map_err(|e| invalid_input(&e))?;
    let pool = state.require_db()?;

    let deal = DealRepository::create(pool, &input)
        .await
        .map_err(write_error)?;

    info!(link_id = %deal.id, user = %claims.username, "Link created");

    let listing = load_listing(pool, deal.id).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// 링크 수정.
///
/// PUT /api/links/{id}
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    SessionAuth(claims): SessionAuth,
    Path(id): Path<Uuid>,
    Json(input): Json<DealInput>,
) -> ApiResult<Json<DealListing>> {
    input.validate().map_err(|e| invalid_input(&e))?;
    let pool = state.require_db()?;

    DealRepository::update(pool, id, &input)
        .await
        .map_err(write_error)?
        .ok_or_else(link_not_found)?;

    info!(link_id = %id, user = %claims.username, "Link updated");

    Ok(Json(load_listing(pool, id).await?))
}

/// 링크 삭제.
///
/// DELETE /api/links/{id}
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    SessionAuth(claims): SessionAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let pool = state.require_db()?;

    if !DealRepository::delete(pool, id).await.map_err(db_error)? {
        return Err(link_not_found());
    }

    info!(link_id = %id, user = %claims.username, "Link deleted");

    Ok(Json(DeleteResponse {
        message: "링크가 삭제되었습니다".to_string(),
    }))
}

/// 링크 관리 라우터 생성.
pub fn links_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_links).post(create_link))
        .route("/{id}", put(update_link).delete(delete_link))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            require_authenticated,
        ))
}
