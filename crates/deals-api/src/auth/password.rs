//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증. 이전 프로비저닝 스크립트가 만든
//! bcrypt 해시(`$2a$`, `$2b$`, `$2y$`)도 검증할 수 있습니다.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use deals_core::AuthConfig;

/// 비밀번호 처리 에러.
///
/// 검증은 에러를 반환하지 않습니다. 형식 오류도 불일치와 같이 `false`입니다.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("잘못된 해시 파라미터: {0}")]
    InvalidParams(String),
}

/// Argon2 작업 계수.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashParams {
    /// `[auth]` 설정에서 생성.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            memory_kib: config.hash_memory_kib,
            iterations: config.hash_iterations,
            parallelism: config.hash_parallelism,
        }
    }

    /// 테스트용 최소 비용.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// 솔트 기반 단방향 비밀번호 해셔.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// 주어진 작업 계수로 Argon2id 해셔를 생성합니다.
    pub fn new(params: HashParams) -> Result<Self, PasswordError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// 비밀번호 해싱.
    ///
    /// 호출마다 새 솔트를 생성하므로 같은 입력이라도 결과가 다릅니다.
    ///
    /// # Returns
    ///
    /// PHC 형식의 해시 문자열 (솔트와 파라미터 포함)
    ///
    /// ```rust,ignore
    /// let hash = hasher.hash("my_secure_password")?;
    /// // "$argon2id$v=19$m=19456,t=2,p=1$..."
    /// ```
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(hash.to_string())
    }

    /// 비밀번호 검증.
    ///
    /// 해시에 포함된 솔트와 파라미터로 다시 계산한 뒤 상수 시간으로 비교합니다.
    /// 불일치, 잘린 해시, 알 수 없는 알고리즘 모두 `false`입니다.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        if is_bcrypt_digest(digest) {
            return bcrypt::verify(plaintext, digest).unwrap_or(false);
        }

        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

/// 평문과 저장된 해시 비교.
///
/// 인증기는 이 trait를 통해 검증하므로 조회 실패 경로도 같은 호출을 거칩니다.
pub trait DigestVerifier: Send + Sync {
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

impl DigestVerifier for PasswordHasher {
    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        PasswordHasher::verify(self, plaintext, digest)
    }
}

fn is_bcrypt_digest(digest: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| digest.starts_with(prefix))
}

/// 비밀번호 강도 검증.
///
/// # 요구사항
///
/// - 최소 8자 이상
/// - 최소 1개의 숫자 포함
/// - 최소 1개의 영문자 포함
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("비밀번호는 최소 8자 이상이어야 합니다");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("비밀번호에 최소 1개의 숫자가 포함되어야 합니다");
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("비밀번호에 최소 1개의 영문자가 포함되어야 합니다");
    }

    Ok(())
}
