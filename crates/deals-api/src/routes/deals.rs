//! 공개 딜 목록 endpoint.
//!
//! 인증 없이 접근 가능합니다.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use deals_core::{
    group_by_category, stores_with_latest, Category, CategoryGroup, DealListing, Store,
    StoreWithDeals,
};

use crate::error::{db_error, ApiResult};
use crate::repository::{CategoryRepository, DealRepository, StoreRepository};
use crate::state::AppState;

/// 딜 목록 (최신순).
///
/// GET /api/deals
pub async fn list_deals(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<DealListing>>> {
    let pool = state.require_db()?;
    let deals = DealRepository::list(pool).await.map_err(db_error)?;
    Ok(Json(deals))
}

/// 스토어 목록.
///
/// GET /api/stores
pub async fn list_stores(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Store>>> {
    let pool = state.require_db()?;
    let stores = StoreRepository::list(pool).await.map_err(db_error)?;
    Ok(Json(stores))
}

/// 카테고리 목록.
///
/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Category>>> {
    let pool = state.require_db()?;
    let categories = CategoryRepository::list(pool).await.map_err(db_error)?;
    Ok(Json(categories))
}

/// 스토어 카드에 보여 줄 최신 딜 수.
pub const STORE_PREVIEW_DEALS: usize = 3;

/// 스토어별 최신 딜.
///
/// GET /api/deals/by-store
pub async fn deals_by_store(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<StoreWithDeals>>> {
    let pool = state.require_db()?;
    let (stores, deals) = tokio::try_join!(StoreRepository::list(pool), DealRepository::list(pool))
        .map_err(db_error)?;

    Ok(Json(stores_with_latest(stores, deals, STORE_PREVIEW_DEALS)))
}

/// 카테고리별 딜 (카테고리 없는 딜은 "Uncategorized").
///
/// GET /api/deals/by-category
pub async fn deals_by_category(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CategoryGroup>>> {
    let pool = state.require_db()?;
    let deals = DealRepository::list(pool).await.map_err(db_error)?;
    Ok(Json(group_by_category(deals)))
}

/// 공개 목록 라우터 생성.
pub fn deals_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deals", get(list_deals))
        .route("/deals/by-store", get(deals_by_store))
        .route("/deals/by-category", get(deals_by_category))
        .route("/stores", get(list_stores))
        .route("/categories", get(list_categories))
}
