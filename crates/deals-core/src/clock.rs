//! 시간 소스 추상화.
//!
//! 세션 발급/검증은 현재 시각을 인자로 받습니다. 핸들러는 [`Clock`]을 통해
//! 시각을 얻고, 테스트는 [`FixedClock`]으로 시간을 고정합니다.

use chrono::{DateTime, Utc};

/// 현재 시각 제공자.
pub trait Clock: Send + Sync {
    /// 현재 UTC 시각.
    fn now(&self) -> DateTime<Utc>;
}

/// 시스템 벽시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 항상 같은 시각을 반환하는 시계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Unix timestamp(초)에서 생성.
    ///
    /// 범위를 벗어난 값은 Unix epoch로 대체됩니다.
    pub fn at_timestamp(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
