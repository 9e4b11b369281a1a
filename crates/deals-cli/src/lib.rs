//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 관리자 계정 생성 (비밀번호 강도 검사 + argon2id 해싱)
//! - 비밀번호 해시 생성 도우미
//! - 샘플 데이터 시드

pub mod commands;
