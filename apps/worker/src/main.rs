//! Warden support session maintenance worker.

#![forbid(unsafe_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warden_application::{InactiveSessionSweeper, SystemClock};
use warden_core::{AppError, AppResult};
use warden_infrastructure::PostgresImpersonationSessionRepository;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    idle_minutes: u32,
    sweep_interval_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let sweeper = build_sweeper(pool);
    let idle_threshold = chrono::Duration::minutes(i64::from(config.idle_minutes));

    info!(
        idle_minutes = config.idle_minutes,
        sweep_interval_seconds = config.sweep_interval_seconds,
        "warden-worker started"
    );

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.sweep_interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match sweeper.sweep(idle_threshold).await {
            Ok(0) => {}
            Ok(ended) => info!(ended, "ended inactive support sessions"),
            Err(error) => warn!(
                error = %error,
                "inactive session sweep failed, retrying on next tick"
            ),
        }
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_sweeper(pool: PgPool) -> InactiveSessionSweeper {
    InactiveSessionSweeper::new(
        Arc::new(PostgresImpersonationSessionRepository::new(pool)),
        Arc::new(SystemClock),
    )
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let idle_minutes = parse_env("SUPPORT_SESSION_IDLE_MINUTES", 120_u32)?;
        let sweep_interval_seconds = parse_env("SWEEP_INTERVAL_SECONDS", 300_u64)?;

        if idle_minutes == 0 {
            return Err(AppError::Validation(
                "SUPPORT_SESSION_IDLE_MINUTES must be greater than zero".to_owned(),
            ));
        }

        if sweep_interval_seconds == 0 {
            return Err(AppError::Validation(
                "SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            idle_minutes,
            sweep_interval_seconds,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
