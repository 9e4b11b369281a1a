//! 딜(링크), 스토어, 카테고리 Repository.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use deals_core::{Category, Deal, DealListing, Store};

// ================================================================================================
// Types
// ================================================================================================

/// 딜 생성/수정 입력.
///
/// 필수 필드가 빠져도 역직렬화는 성공하고 검증 단계에서 400으로 거부됩니다.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "제목은 1-300자여야 합니다"))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "validate_http_url"))]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub price: Option<Decimal>,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub weight: Option<Decimal>,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative"))]
    pub shipping: Option<Decimal>,
    #[serde(default, alias = "store_id")]
    #[validate(required(message = "스토어를 지정해야 합니다"))]
    pub store_id: Option<Uuid>,
    #[serde(default, alias = "category_id")]
    pub category_id: Option<Uuid>,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_url")
            .with_message("URL은 http:// 또는 https://로 시작해야 합니다".into()))
    }
}

/// 참고: Option 필드에 사용 시 validator가 Some일 때만 호출하므로 &Decimal을 받음
fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_value")
            .with_message("음수는 허용되지 않습니다".into()));
    }
    Ok(())
}

/// 빈 문자열은 값 없음으로 취급.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

const LISTING_SELECT: &str = r#"
    SELECT
        l.id, l.title, l.url, l.description, l.price, l.weight, l.shipping,
        l.image_url, l.store_id, l.category_id, l.created_at, l.updated_at,
        s.name AS store_name,
        c.name AS category_name
    FROM links l
    JOIN stores s ON s.id = l.store_id
    LEFT JOIN categories c ON c.id = l.category_id
"#;

// ================================================================================================
// Repository
// ================================================================================================

/// 딜 Repository
pub struct DealRepository;

impl DealRepository {
    /// 모든 딜 조회 (스토어/카테고리 이름 포함, 최신순)
    pub async fn list(pool: &PgPool) -> Result<Vec<DealListing>, sqlx::Error> {
        let query = format!("{LISTING_SELECT} ORDER BY l.created_at DESC");
        sqlx::query_as::<_, DealListing>(&query).fetch_all(pool).await
    }

    /// ID로 딜 조회
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DealListing>, sqlx::Error> {
        let query = format!("{LISTING_SELECT} WHERE l.id = $1");
        sqlx::query_as::<_, DealListing>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 딜 생성
    pub async fn create(pool: &PgPool, input: &DealInput) -> Result<Deal, sqlx::Error> {
        sqlx::query_as::<_, Deal>(
            r#"
            INSERT INTO links
                (id, title, url, description, price, weight, shipping, store_id, category_id, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.title.trim())
        .bind(input.url.trim())
        .bind(non_empty(&input.description))
        .bind(input.price)
        .bind(input.weight)
        .bind(input.shipping)
        .bind(input.store_id)
        .bind(input.category_id)
        .bind(non_empty(&input.image_url))
        .fetch_one(pool)
        .await
    }

    /// 딜 수정. 없으면 `None`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &DealInput,
    ) -> Result<Option<Deal>, sqlx::Error> {
        sqlx::query_as::<_, Deal>(
            r#"
            UPDATE links
            SET title = $2, url = $3, description = $4, price = $5, weight = $6,
                shipping = $7, store_id = $8, category_id = $9, image_url = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.trim())
        .bind(input.url.trim())
        .bind(non_empty(&input.description))
        .bind(input.price)
        .bind(input.weight)
        .bind(input.shipping)
        .bind(input.store_id)
        .bind(input.category_id)
        .bind(non_empty(&input.image_url))
        .fetch_optional(pool)
        .await
    }

    /// 딜 삭제. 삭제되었으면 `true`.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// URL이 같은 딜이 없을 때만 생성 (시드 데이터용). 생성했으면 `true`.
    pub async fn insert_if_absent(pool: &PgPool, input: &DealInput) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE url = $1)")
            .bind(input.url.trim())
            .fetch_one(pool)
            .await?;

        if exists {
            return Ok(false);
        }

        Self::create(pool, input).await?;
        Ok(true)
    }
}

/// 스토어 Repository
pub struct StoreRepository;

impl StoreRepository {
    /// 모든 스토어 조회 (최신순)
    pub async fn list(pool: &PgPool) -> Result<Vec<Store>, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            "SELECT id, name, description, created_at FROM stores ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// 이름 기준 upsert. 이미 있으면 기존 레코드를 반환합니다.
    pub async fn upsert(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
    ) -> Result<Store, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await
    }
}

/// 카테고리 Repository
pub struct CategoryRepository;

impl CategoryRepository {
    /// 모든 카테고리 조회 (최신순)
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// 이름 기준 upsert. 이미 있으면 기존 레코드를 반환합니다.
    pub async fn upsert(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_input() -> DealInput {
        DealInput {
            title: "Nike Air Force 1".to_string(),
            url: "https://nike.com/air-force-1".to_string(),
            price: Some(dec!(99.99)),
            shipping: Some(dec!(6000)),
            store_id: Some(Uuid::new_v4()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = DealInput::default().validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("url"));
        assert!(fields.contains_key("store_id"));
    }

    #[test]
    fn test_invalid_url_and_negative_price() {
        let input = DealInput {
            url: "javascript:alert(1)".to_string(),
            price: Some(dec!(-1)),
            ..valid_input()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("url"));
        assert!(fields.contains_key("price"));
        assert!(!fields.contains_key("title"));
    }

    #[test]
    fn test_deserialize_camel_and_snake_case() {
        let store_id = Uuid::new_v4();
        let camel: DealInput = serde_json::from_value(serde_json::json!({
            "title": "Adidas Ultraboost",
            "url": "https://adidas.com/ultraboost",
            "price": "179.99",
            "storeId": store_id,
            "imageUrl": "https://img.example.com/a.png"
        }))
        .unwrap();
        assert_eq!(camel.store_id, Some(store_id));
        assert_eq!(camel.price, Some(dec!(179.99)));
        assert!(camel.image_url.is_some());

        let snake: DealInput = serde_json::from_value(serde_json::json!({
            "title": "Adidas Ultraboost",
            "url": "https://adidas.com/ultraboost",
            "store_id": store_id
        }))
        .unwrap();
        assert_eq!(snake.store_id, Some(store_id));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some(" text ".to_string())), Some("text"));
        assert_eq!(non_empty(&None), None);
    }
}
