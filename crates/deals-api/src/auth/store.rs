//! 자격증명 저장소.
//!
//! 인증 흐름이 저장소에 요구하는 것은 사용자 이름 조회 하나뿐입니다.
//! 준비 상태 확인(`ping`)은 `/health/ready`가 사용합니다.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use deals_core::User;
use sqlx::PgPool;

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("자격증명 저장소 조회 실패: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// 사용자 조회 계약.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자 이름으로 조회. 없으면 `Ok(None)`.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// 조회를 처리할 수 있는 상태인지 확인.
    async fn ping(&self) -> Result<(), StoreError>;

    /// 저장소 종류 (헬스 체크 표시용).
    fn backend(&self) -> &'static str;
}

/// PostgreSQL `users` 테이블 기반 저장소.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 관리자 계정 생성 또는 비밀번호 교체.
    ///
    /// 이미 있는 사용자면 해시를 갱신하고 관리자 권한을 부여합니다.
    pub async fn upsert_admin(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, is_admin)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (username)
            DO UPDATE SET password_hash = EXCLUDED.password_hash, is_admin = TRUE, updated_at = NOW()
            RETURNING id, username, password_hash, is_admin, created_at
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// 메모리 기반 저장소.
///
/// DB 없이 서버를 띄우거나 테스트할 때 사용합니다.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 목록으로 생성.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    /// 사용자 추가 (같은 이름이면 교체).
    pub fn insert(&self, user: User) {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(user.username.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))?;
        Ok(users.get(username).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.users
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
