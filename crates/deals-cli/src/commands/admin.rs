//! 관리자 계정 명령어.
//!
//! # 사용 예시
//!
//! ```bash
//! # 관리자 생성 (비밀번호는 환경변수로 전달 권장)
//! DEALS_ADMIN_PASSWORD='s3cret-pass' deals create-admin --username admin
//!
//! # 비밀번호 해시만 생성
//! echo 's3cret-pass' | deals hash-password
//! ```

use std::io::BufRead;

use anyhow::{anyhow, bail, Result};
use tracing::info;

use deals_api::auth::{validate_password_strength, HashParams, PasswordHasher, PgCredentialStore};

/// 관리자 생성 설정.
#[derive(Clone)]
pub struct CreateAdminConfig {
    pub username: String,
    pub password: String,
    pub db_url: Option<String>,
    pub hash_params: HashParams,
}

impl std::fmt::Debug for CreateAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAdminConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("db_url", &self.db_url.as_ref().map(|_| "[SET]"))
            .finish()
    }
}

/// 사용자 이름과 비밀번호를 검사하고 argon2id 해시를 만듭니다.
pub fn prepare_credentials(
    username: &str,
    password: &str,
    hash_params: HashParams,
) -> Result<(String, String)> {
    let username = username.trim();
    if username.is_empty() {
        bail!("사용자 이름이 비어 있습니다");
    }

    validate_password_strength(password).map_err(|reason| anyhow!(reason))?;

    let hasher = PasswordHasher::new(hash_params)?;
    let digest = hasher.hash(password)?;

    Ok((username.to_string(), digest))
}

/// 관리자 계정을 생성하거나 비밀번호를 교체합니다.
pub async fn create_admin(config: CreateAdminConfig) -> Result<()> {
    let (username, digest) =
        prepare_credentials(&config.username, &config.password, config.hash_params)?;

    let pool = super::connect(config.db_url.as_deref()).await?;
    let store = PgCredentialStore::new(pool);
    let user = store.upsert_admin(&username, &digest).await?;

    info!(user_id = %user.id, username = %user.username, "Admin account provisioned");
    Ok(())
}

/// 입력의 첫 줄을 비밀번호로 읽습니다 (줄바꿈 제거).
pub fn read_password<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("입력된 비밀번호가 없습니다");
    }
    Ok(password)
}

/// 표준 입력의 비밀번호를 해싱합니다.
pub fn hash_password<R: BufRead>(reader: R, hash_params: HashParams) -> Result<String> {
    let password = read_password(reader)?;
    let hasher = PasswordHasher::new(hash_params)?;
    Ok(hasher.hash(&password)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_credentials() {
        let (username, digest) =
            prepare_credentials("  admin ", "admin1234", HashParams::minimal()).unwrap();

        assert_eq!(username, "admin");
        assert!(digest.starts_with("$argon2id$"));

        let hasher = PasswordHasher::new(HashParams::minimal()).unwrap();
        assert!(hasher.verify("admin1234", &digest));
    }

    fn phc_params(digest: &str) -> &str {
        digest.split('$').nth(3).unwrap()
    }

    #[test]
    fn test_digest_uses_configured_params() {
        let mut auth = deals_core::AuthConfig::default();
        auth.hash_memory_kib = 16;
        auth.hash_iterations = 2;
        auth.hash_parallelism = 1;

        let (_, digest) =
            prepare_credentials("admin", "admin1234", HashParams::from_config(&auth)).unwrap();
        assert_eq!(phc_params(&digest), "m=16,t=2,p=1");

        // 서버 해셔(로그인 실패 경로의 더미 해시 포함)와 같은 작업 계수
        let server = PasswordHasher::new(HashParams::from_config(&auth)).unwrap();
        assert_eq!(phc_params(&server.hash("unrelated-input").unwrap()), phc_params(&digest));
    }

    #[test]
    fn test_prepare_credentials_rejects_weak_password() {
        assert!(prepare_credentials("admin", "short1", HashParams::minimal()).is_err());
        assert!(prepare_credentials("admin", "onlyletters", HashParams::minimal()).is_err());
        assert!(prepare_credentials("   ", "admin1234", HashParams::minimal()).is_err());
    }

    #[test]
    fn test_read_password_strips_newline() {
        let password = read_password("p@ss word 1\r\nignored\n".as_bytes()).unwrap();
        assert_eq!(password, "p@ss word 1");

        assert!(read_password("\n".as_bytes()).is_err());
        assert!(read_password("".as_bytes()).is_err());
    }

    #[test]
    fn test_hash_password_from_reader() {
        let digest = hash_password("admin123\n".as_bytes(), HashParams::minimal()).unwrap();
        let hasher = PasswordHasher::new(HashParams::minimal()).unwrap();
        assert!(hasher.verify("admin123", &digest));
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let config = CreateAdminConfig {
            username: "admin".to_string(),
            password: "admin1234".to_string(),
            db_url: Some("postgres://user:pw@localhost/deals".to_string()),
            hash_params: HashParams::minimal(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("admin1234"));
        assert!(!debug.contains("pw@localhost"));
    }
}
