//! 인증 및 권한 부여.
//!
//! 자격증명 로그인, 서명된 무상태 세션, 접근 수준 기반 게이트를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`PasswordHasher`]: Argon2id 비밀번호 해싱/검증 (bcrypt 레거시 해시 검증 포함)
//! - [`CredentialStore`]: 사용자 이름 조회 계약
//! - [`Authenticator`]: (사용자 이름, 비밀번호) 검증
//! - [`SessionIssuer`] / [`SessionVerifier`]: HS256 세션 토큰 발급/검증
//! - [`SessionState`], [`authorize`]: 요청 단위 접근 판정
//! - [`SessionAuth`], [`AdminAuth`]: Axum 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn dashboard(AdminAuth(claims): AdminAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.username)
//! }
//! ```

mod authenticator;
mod gate;
mod middleware;
mod password;
mod session;
mod store;

pub use authenticator::{AuthError, Authenticator, Identity};
pub use gate::{authorize, AccessLevel, AuthzError, SessionState};
pub use middleware::{
    clear_session_cookie, cookie_value, require_admin, require_authenticated, session_cookie,
    session_token, AdminAuth, SessionAuth,
};
pub use password::{
    validate_password_strength, DigestVerifier, HashParams, PasswordError, PasswordHasher,
};
pub use session::{
    session_pair, IdentityClaims, IssuedSession, SessionError, SessionIssuer, SessionKeys,
    SessionVerifier,
};
pub use store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore, StoreError};
