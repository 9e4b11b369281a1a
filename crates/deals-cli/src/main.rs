//! 딜 사이트 관리 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 마이그레이션 적용
//! deals migrate
//!
//! # 관리자 계정 생성
//! DEALS_ADMIN_PASSWORD='s3cret-pass' deals create-admin --username admin
//!
//! # 샘플 스토어/카테고리/딜 넣기
//! deals seed
//!
//! # 비밀번호 해시 생성 (해시 파라미터는 config/default.toml의 [auth])
//! echo 's3cret-pass' | deals hash-password
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use deals_cli::commands::admin::{create_admin, hash_password, CreateAdminConfig};
use deals_cli::commands::{connect, hash_params, seed};

#[derive(Parser)]
#[command(name = "deals")]
#[command(about = "Deals site CLI - 관리자 계정 및 샘플 데이터 관리", long_about = None)]
#[command(version)]
struct Cli {
    /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
    #[arg(long, global = true)]
    db_url: Option<String>,

    /// 설정 파일 경로 (`[auth]` 해시 파라미터를 서버와 공유)
    #[arg(long, global = true, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 데이터베이스 마이그레이션 적용
    Migrate,

    /// 관리자 계정 생성 (이미 있으면 비밀번호 교체)
    CreateAdmin {
        /// 로그인 이름
        #[arg(short, long)]
        username: String,

        /// 비밀번호 (생략 시 DEALS_ADMIN_PASSWORD 환경변수)
        #[arg(short, long, env = "DEALS_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// 표준 입력의 비밀번호로 argon2id 해시 출력
    HashPassword,

    /// 샘플 스토어/카테고리/딜 시드
    Seed {
        /// 함께 만들 `admin` 계정의 비밀번호 (생략 시 관리자 미생성)
        #[arg(long, env = "DEALS_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // 트레이싱 초기화 (stdout은 hash-password 출력용으로 비워 둠)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deals_cli=info,deals_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            let pool = connect(cli.db_url.as_deref()).await?;
            info!("Running database migrations...");
            sqlx::migrate!("../../migrations").run(&pool).await?;
            info!("Migrations completed successfully");
        }

        Commands::CreateAdmin { username, password } => {
            let config = CreateAdminConfig {
                username,
                password,
                db_url: cli.db_url,
                hash_params: hash_params(&cli.config)?,
            };

            if let Err(e) = create_admin(config).await {
                error!("Failed to create admin: {:#}", e);
                return Err(e);
            }
            println!("관리자 계정이 준비되었습니다");
        }

        Commands::HashPassword => {
            let stdin = std::io::stdin();
            let digest = hash_password(stdin.lock(), hash_params(&cli.config)?)?;
            println!("{}", digest);
        }

        Commands::Seed { admin_password } => {
            let params = hash_params(&cli.config)?;
            let pool = connect(cli.db_url.as_deref()).await?;
            let summary = seed::seed(&pool, admin_password.as_deref(), params).await?;

            println!(
                "시드 완료: 스토어 {}개, 카테고리 {}개, 새 딜 {}개",
                summary.stores, summary.categories, summary.deals_inserted
            );
            if summary.admin_provisioned {
                println!("관리자 계정: admin");
            }
        }
    }

    Ok(())
}
