//! 딜 사이트 도메인 모델.

mod deal;
mod user;

pub use deal::*;
pub use user::*;
