//! CLI 명령어 구현 모듈.

pub mod admin;
pub mod seed;

use std::path::Path;

use anyhow::{Context, Result};
use deals_api::auth::HashParams;
use deals_core::AppConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// 설정 파일과 `DEALS__` 환경 변수의 `[auth]` 해시 파라미터.
///
/// 서버의 로그인 검증과 같은 작업 계수로 해시를 만들기 위해 사용합니다.
/// 서명 키 등 서버 전용 설정은 검증하지 않습니다.
pub fn hash_params(config_path: &Path) -> Result<HashParams> {
    let config = AppConfig::read_with_prefix(config_path, "DEALS")
        .with_context(|| format!("설정 로드 실패: {}", config_path.display()))?;
    Ok(HashParams::from_config(&config.auth))
}

/// 데이터베이스 연결.
///
/// URL이 없으면 `DATABASE_URL` 환경변수를 사용합니다.
pub async fn connect(db_url: Option<&str>) -> Result<PgPool> {
    let url = match db_url {
        Some(url) => url.to_string(),
        None => std::env::var("DATABASE_URL")
            .context("DATABASE_URL 환경변수 또는 --db-url 인자가 필요합니다")?,
    };

    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("데이터베이스 연결 실패")
}
