//! API 서버용 HTTP middleware.

mod metrics;
mod rate_limit;

pub use metrics::metrics_layer;
pub use rate_limit::{
    extract_client_ip, login_rate_limit, spawn_cleanup_task, RateLimitConfig, RateLimitResult,
    RateLimiter,
};
