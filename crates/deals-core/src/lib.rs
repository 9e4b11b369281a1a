//! # Deals Core
//!
//! 딜 목록 사이트의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 백엔드 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자(자격증명) 레코드
//! - 딜, 스토어, 카테고리 모델
//! - 설정 관리
//! - 로깅 인프라
//! - 시계 추상화 (테스트에서 시간 주입)

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
