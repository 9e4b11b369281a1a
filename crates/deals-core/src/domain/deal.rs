//! 딜(링크), 스토어, 카테고리 모델.
//!
//! 선택 컬럼은 모두 `Option<T>`로 표현합니다.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 스토어.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 카테고리.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 딜 (외부 쇼핑몰 상품 링크).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Deal {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub description: Option<String>,
    /// 가격
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub price: Option<Decimal>,
    /// 무게 (kg)
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub weight: Option<Decimal>,
    /// 배송비
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub shipping: Option<Decimal>,
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub image_url: Option<String>,
    pub store_id: Uuid,
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 스토어/카테고리 이름이 포함된 딜 (목록 조회용).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct DealListing {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx-support", sqlx(flatten))]
    pub deal: Deal,
    pub store_name: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(default))]
    pub category_name: Option<String>,
}

/// 카테고리가 없는 딜이 묶이는 이름.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// 최신 딜이 붙은 스토어.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreWithDeals {
    #[serde(flatten)]
    pub store: Store,
    /// 최신순
    pub latest_deals: Vec<DealListing>,
}

/// 카테고리 이름별 딜 묶음.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub deals: Vec<DealListing>,
}

/// 각 스토어에 최신 딜을 최대 `per_store`개씩 붙입니다.
///
/// `deals`는 최신순이어야 합니다. 스토어 순서는 입력 순서를 따릅니다.
pub fn stores_with_latest(
    stores: Vec<Store>,
    deals: Vec<DealListing>,
    per_store: usize,
) -> Vec<StoreWithDeals> {
    let mut by_store: HashMap<Uuid, Vec<DealListing>> = HashMap::new();
    for listing in deals {
        let bucket = by_store.entry(listing.deal.store_id).or_default();
        if bucket.len() < per_store {
            bucket.push(listing);
        }
    }

    stores
        .into_iter()
        .map(|store| StoreWithDeals {
            latest_deals: by_store.remove(&store.id).unwrap_or_default(),
            store,
        })
        .collect()
}

/// 딜을 카테고리 이름으로 묶습니다.
///
/// 카테고리가 없으면 [`UNCATEGORIZED`]. 묶음 순서는 처음 등장한 순서이고
/// 묶음 안의 딜 순서는 입력 순서를 유지합니다.
pub fn group_by_category(deals: Vec<DealListing>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for listing in deals {
        let name = listing
            .category_name
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let slot = *index.entry(name.clone()).or_insert_with(|| {
            groups.push(CategoryGroup {
                category: name,
                deals: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].deals.push(listing);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sample_deal() -> Deal {
        Deal {
            id: Uuid::new_v4(),
            title: "Nike Air Force 1".to_string(),
            url: "https://nike.com/air-force-1".to_string(),
            description: Some("Classic Nike sneakers".to_string()),
            price: Some(dec!(99.99)),
            weight: Some(dec!(1.0)),
            shipping: Some(dec!(6000)),
            image_url: None,
            store_id: Uuid::new_v4(),
            category_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn store(name: &str) -> Store {
        Store {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn listing(title: &str, store: &Store, category: Option<&str>) -> DealListing {
        DealListing {
            deal: Deal {
                title: title.to_string(),
                store_id: store.id,
                ..sample_deal()
            },
            store_name: store.name.clone(),
            category_name: category.map(str::to_string),
        }
    }

    fn titles(deals: &[DealListing]) -> Vec<&str> {
        deals.iter().map(|d| d.deal.title.as_str()).collect()
    }

    #[test]
    fn test_listing_serializes_flat() {
        let listing = DealListing {
            deal: sample_deal(),
            store_name: "Nike".to_string(),
            category_name: None,
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["title"], "Nike Air Force 1");
        assert_eq!(json["store_name"], "Nike");
        assert!(json["category_name"].is_null());
    }

    #[test]
    fn test_stores_with_latest_keeps_newest_three() {
        let nike = store("Nike");
        let adidas = store("Adidas");
        let empty = store("Puma");

        let deals = vec![
            listing("n5", &nike, None),
            listing("a2", &adidas, None),
            listing("n4", &nike, None),
            listing("n3", &nike, None),
            listing("a1", &adidas, None),
            listing("n2", &nike, None),
        ];

        let grouped = stores_with_latest(vec![nike, adidas, empty], deals, 3);

        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].store.name, "Nike");
        assert_eq!(titles(&grouped[0].latest_deals), ["n5", "n4", "n3"]);
        assert_eq!(titles(&grouped[1].latest_deals), ["a2", "a1"]);
        assert!(grouped[2].latest_deals.is_empty());

        let json = serde_json::to_value(&grouped[0]).unwrap();
        assert_eq!(json["name"], "Nike");
        assert_eq!(json["latest_deals"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_group_by_category_with_uncategorized_bucket() {
        let nike = store("Nike");
        let deals = vec![
            listing("air force", &nike, Some("Shoes")),
            listing("tee", &nike, None),
            listing("ultraboost", &nike, Some("Shoes")),
            listing("hoodie", &nike, Some("Clothing")),
        ];

        let groups = group_by_category(deals);
        let names: Vec<_> = groups.iter().map(|g| g.category.as_str()).collect();

        assert_eq!(names, ["Shoes", UNCATEGORIZED, "Clothing"]);
        assert_eq!(titles(&groups[0].deals), ["air force", "ultraboost"]);
        assert_eq!(titles(&groups[1].deals), ["tee"]);
    }

    #[test]
    fn test_group_by_category_empty() {
        assert!(group_by_category(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_group_by_category_partitions(
            categories in proptest::collection::vec(
                proptest::option::of(proptest::sample::select(vec!["Shoes", "Clothing", "Bags"])),
                0..40,
            ),
        ) {
            let nike = store("Nike");
            let deals: Vec<_> = categories
                .iter()
                .enumerate()
                .map(|(i, c)| listing(&i.to_string(), &nike, c.as_deref()))
                .collect();

            let groups = group_by_category(deals);

            let total: usize = groups.iter().map(|g| g.deals.len()).sum();
            prop_assert_eq!(total, categories.len());

            for group in &groups {
                for deal in &group.deals {
                    let expected = deal.category_name.as_deref().unwrap_or(UNCATEGORIZED);
                    prop_assert_eq!(expected, group.category.as_str());
                }
                // 묶음 안에서는 입력 순서 유지
                let order: Vec<usize> =
                    group.deals.iter().map(|d| d.deal.title.parse().unwrap()).collect();
                prop_assert!(order.windows(2).all(|w| w[0] < w[1]));
            }
        }

        #[test]
        fn prop_stores_with_latest_respects_limit(
            picks in proptest::collection::vec(0usize..3, 0..30),
            per_store in 0usize..5,
        ) {
            let stores: Vec<_> = ["Nike", "Adidas", "Puma"].iter().map(|n| store(n)).collect();
            let deals: Vec<_> = picks
                .iter()
                .enumerate()
                .map(|(i, &s)| listing(&i.to_string(), &stores[s], None))
                .collect();

            let grouped = stores_with_latest(stores.clone(), deals, per_store);

            prop_assert_eq!(grouped.len(), 3);
            for (s, entry) in grouped.iter().enumerate() {
                let available = picks.iter().filter(|&&p| p == s).count();
                prop_assert_eq!(entry.latest_deals.len(), available.min(per_store));
                prop_assert!(entry.latest_deals.iter().all(|d| d.deal.store_id == entry.store.id));
            }
        }
    }
}
