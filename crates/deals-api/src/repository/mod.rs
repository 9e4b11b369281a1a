//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 모든 Repository는 static methods 패턴을 사용합니다.
//! 사용자 조회는 [`crate::auth::PgCredentialStore`]가 담당합니다.

pub mod deals;

pub use deals::{CategoryRepository, DealInput, DealRepository, StoreRepository};
