//! 자격증명 인증.
//!
//! (사용자 이름, 비밀번호)를 저장소와 해셔로 검증합니다.
//!
//! 사용자 이름이 없을 때와 비밀번호가 틀릴 때는 같은 에러를 반환하며,
//! 두 경로의 비용도 비슷해야 합니다. 조회 실패 시에도 미리 만들어 둔
//! 더미 해시로 검증을 한 번 수행하여 응답 시간으로 사용자 존재 여부를
//! 추정할 수 없게 합니다.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::password::{DigestVerifier, PasswordError, PasswordHasher};
use super::store::CredentialStore;
use crate::metrics::record_login_attempt;

/// 해싱 전에 거부하는 입력 길이 상한 (바이트).
const MAX_CREDENTIAL_LEN: usize = 1024;

/// 인증된 사용자.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 사용자 ID
    pub id: Uuid,
    /// 사용자 이름
    pub username: String,
    /// 관리자 여부
    pub is_admin: bool,
}

/// 인증 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// 알 수 없는 사용자 또는 잘못된 비밀번호. 두 경우를 구분하지 않습니다.
    #[error("사용자 이름 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,
    /// 저장소 장애. 자격증명 판정이 아닙니다.
    #[error("인증 서비스를 사용할 수 없습니다")]
    StoreUnavailable,
}

/// 자격증명 검증기.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn DigestVerifier>,
    dummy_digest: Arc<str>,
}

impl Authenticator {
    /// 새 인증기 생성.
    ///
    /// 조회 실패 경로에서 사용할 더미 해시를 같은 파라미터로 만들어 둡니다.
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Result<Self, PasswordError> {
        let dummy_digest = hasher.hash(&Uuid::new_v4().to_string())?;

        Ok(Self {
            store,
            verifier: Arc::new(hasher),
            dummy_digest: Arc::from(dummy_digest),
        })
    }

    /// 자격증명 저장소.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// 자격증명 검증.
    ///
    /// 해시 검증은 blocking 풀에서 실행됩니다.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        if username.is_empty()
            || password.is_empty()
            || username.len() > MAX_CREDENTIAL_LEN
            || password.len() > MAX_CREDENTIAL_LEN
        {
            record_login_attempt("invalid_credentials");
            debug!("Login rejected: empty or oversized credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.store.find_by_username(username).await {
            Ok(user) => user,
            Err(e) => {
                record_login_attempt("unavailable");
                error!(error = %e, "Credential store lookup failed");
                return Err(AuthError::StoreUnavailable);
            }
        };

        // 조회 실패 시에도 같은 비용의 검증을 수행
        let digest: Arc<str> = match &user {
            Some(user) => Arc::from(user.password_hash.as_str()),
            None => Arc::clone(&self.dummy_digest),
        };

        let verified = self.verify_blocking(password, digest).await;

        match user {
            Some(user) if verified => {
                record_login_attempt("success");
                info!(
                    username = %user.username,
                    user_id = %user.id,
                    is_admin = user.is_admin,
                    "Login succeeded"
                );
                Ok(Identity {
                    id: user.id,
                    username: user.username,
                    is_admin: user.is_admin,
                })
            }
            _ => {
                record_login_attempt("invalid_credentials");
                info!(username = %username, "Login rejected: invalid credentials");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn verify_blocking(&self, password: &str, digest: Arc<str>) -> bool {
        let verifier = Arc::clone(&self.verifier);
        let password = password.to_owned();

        match tokio::task::spawn_blocking(move || verifier.verify(&password, &digest)).await {
            Ok(verified) => verified,
            Err(e) => {
                // 검증 작업이 패닉하면 실패로 처리
                warn!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}
