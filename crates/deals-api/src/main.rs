//! 딜 목록 사이트 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 로그인/세션, 딜 조회, 링크 관리, 관리자 대시보드 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use deals_api::auth::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
use deals_api::metrics::setup_metrics_recorder;
use deals_api::middleware::spawn_cleanup_task;
use deals_api::routes::create_app;
use deals_api::state::AppState;
use deals_core::{init_logging, AppConfig, DatabaseConfig, LogConfig};

/// 데이터베이스 연결 (URL 미설정 시 `None`).
///
/// 연결에 실패하면 DB 없이 기동하지 않고 에러를 반환합니다.
async fn connect_database(
    config: &DatabaseConfig,
) -> Result<Option<PgPool>, Box<dyn std::error::Error>> {
    let Some(url) = config.url.as_deref() else {
        warn!("database.url not set, database features will be disabled");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(url)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            e
        })?;

    info!("Connected to PostgreSQL successfully");

    if config.run_migrations {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Migrations completed successfully");
    }

    Ok(Some(pool))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드 (세션 서명 키 누락은 기동 실패)
    let config = match AppConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            return Err(e.into());
        }
    };

    init_logging(LogConfig::from_config(&config.logging))?;

    info!("Starting Deals API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "Failed to install metrics recorder, /metrics disabled");
            None
        }
    };

    let addr: SocketAddr = config.server.bind_addr().parse().map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. server.host, server.port를 확인하세요."
        );
        e
    })?;

    let db_pool = connect_database(&config.database).await?;

    let store: Arc<dyn CredentialStore> = match &db_pool {
        Some(pool) => Arc::new(PgCredentialStore::new(pool.clone())),
        None => {
            warn!("No database configured, using empty in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let state = Arc::new(AppState::from_config(&config, store, db_pool)?);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        session_ttl_secs = state.issuer.ttl().num_seconds(),
        login_rate_limited = state.login_limiter.is_some(),
        "Application state initialized"
    );

    // 전역 종료 토큰 (백그라운드 태스크 종료 전파)
    let shutdown_token = CancellationToken::new();

    if let Some(limiter) = state.login_limiter.clone() {
        spawn_cleanup_task(limiter, shutdown_token.clone());
    }

    let app = create_app(state, &config.server, metrics_handle);

    info!(%addr, "API server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
    .await?;

    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
