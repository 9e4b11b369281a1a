//! 사용자(자격증명) 레코드.
//!
//! 비밀번호 해시는 자격증명 저장소 경계 밖으로 나가지 않습니다.
//! `User`는 직렬화되지 않으며 `Debug` 출력에서도 해시가 가려집니다.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 로그인 가능한 사용자.
#[derive(Clone)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct User {
    /// 사용자 ID
    pub id: Uuid,
    /// 로그인 이름 (고유, 생성 후 불변)
    pub username: String,
    /// PHC 형식 비밀번호 해시 (argon2id 또는 레거시 bcrypt)
    pub password_hash: String,
    /// 관리자 여부
    pub is_admin: bool,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 새 사용자 레코드 생성 (ID와 생성 시각 자동 부여).
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            is_admin,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("is_admin", &self.is_admin)
            .field("created_at", &self.created_at)
            .finish()
    }
}
