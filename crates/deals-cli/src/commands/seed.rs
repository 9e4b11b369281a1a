//! 샘플 데이터 시드.
//!
//! 스토어, 카테고리, 딜을 이름/URL 기준으로 멱등하게 넣습니다.
//! 관리자 비밀번호가 주어지면 `admin` 계정도 함께 만듭니다.

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use deals_api::auth::{HashParams, PgCredentialStore};
use deals_api::repository::{CategoryRepository, DealInput, DealRepository, StoreRepository};

use super::admin::prepare_credentials;

/// 시드 스토어 (이름, 설명).
pub const STORES: &[(&str, &str)] = &[
    ("Nike", "Official Nike Store"),
    ("Adidas", "Official Adidas Store"),
];

/// 시드 카테고리 (이름, 설명).
pub const CATEGORIES: &[(&str, &str)] = &[("Shoes", "Footwear"), ("Clothing", "Apparel")];

/// 시드 딜.
#[derive(Debug, Clone, Copy)]
pub struct SeedDeal {
    pub title: &'static str,
    pub url: &'static str,
    pub description: &'static str,
    pub price: Decimal,
    pub weight: Decimal,
    pub shipping: Decimal,
    pub store: &'static str,
    pub category: &'static str,
}

/// 시드 딜 목록.
pub fn seed_deals() -> Vec<SeedDeal> {
    vec![
        SeedDeal {
            title: "Nike Air Force 1",
            url: "https://nike.com/air-force-1",
            description: "Classic Nike sneakers",
            price: dec!(99.99),
            weight: dec!(1.0),
            shipping: dec!(6000),
            store: "Nike",
            category: "Shoes",
        },
        SeedDeal {
            title: "Adidas Ultraboost",
            url: "https://adidas.com/ultraboost",
            description: "Premium running shoes",
            price: dec!(179.99),
            weight: dec!(0.8),
            shipping: dec!(4800),
            store: "Adidas",
            category: "Shoes",
        },
    ]
}

/// 시드 결과 요약.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub stores: usize,
    pub categories: usize,
    pub deals_inserted: usize,
    pub admin_provisioned: bool,
}

/// 시드 딜을 저장용 입력으로 변환합니다.
pub fn to_input(
    deal: &SeedDeal,
    store_id: Uuid,
    category_id: Option<Uuid>,
) -> DealInput {
    DealInput {
        title: deal.title.to_string(),
        url: deal.url.to_string(),
        description: Some(deal.description.to_string()),
        price: Some(deal.price),
        weight: Some(deal.weight),
        shipping: Some(deal.shipping),
        store_id: Some(store_id),
        category_id,
        image_url: None,
    }
}

/// 샘플 데이터를 넣습니다. 여러 번 실행해도 중복되지 않습니다.
pub async fn seed(
    pool: &PgPool,
    admin_password: Option<&str>,
    hash_params: HashParams,
) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut stores = Vec::with_capacity(STORES.len());
    for &(name, description) in STORES {
        stores.push(StoreRepository::upsert(pool, name, Some(description)).await?);
    }
    summary.stores = stores.len();

    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for &(name, description) in CATEGORIES {
        categories.push(CategoryRepository::upsert(pool, name, Some(description)).await?);
    }
    summary.categories = categories.len();

    for deal in seed_deals() {
        let Some(store) = stores.iter().find(|s| s.name == deal.store) else {
            anyhow::bail!("시드 스토어를 찾을 수 없습니다: {}", deal.store);
        };
        let category_id = categories
            .iter()
            .find(|c| c.name == deal.category)
            .map(|c| c.id);

        if DealRepository::insert_if_absent(pool, &to_input(&deal, store.id, category_id)).await? {
            summary.deals_inserted += 1;
        }
    }

    if let Some(password) = admin_password {
        let (username, digest) = prepare_credentials("admin", password, hash_params)?;
        PgCredentialStore::new(pool.clone())
            .upsert_admin(&username, &digest)
            .await?;
        summary.admin_provisioned = true;
    }

    info!(
        stores = summary.stores,
        categories = summary.categories,
        deals_inserted = summary.deals_inserted,
        admin_provisioned = summary.admin_provisioned,
        "Seed completed"
    );

    Ok(summary)
}
