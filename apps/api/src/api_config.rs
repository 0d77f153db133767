use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use warden_core::AppError;
use warden_infrastructure::MIN_SESSION_SECRET_LEN;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub support_session_secret: String,
    pub support_session_ttl_hours: u32,
    pub upstream_api_url: String,
    pub upstream_shared_secret: String,
    pub upstream_timeout: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let support_session_secret = required_non_empty_env("SUPPORT_SESSION_SECRET")?;
        if support_session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::Validation(format!(
                "SUPPORT_SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} characters"
            )));
        }

        let support_session_ttl_hours = parse_env("SUPPORT_SESSION_TTL_HOURS", 8_u32)?;
        if support_session_ttl_hours == 0 {
            return Err(AppError::Validation(
                "SUPPORT_SESSION_TTL_HOURS must be greater than zero".to_owned(),
            ));
        }

        let upstream_api_url = required_non_empty_env("UPSTREAM_API_URL")?;
        url::Url::parse(upstream_api_url.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid UPSTREAM_API_URL: {error}"))
        })?;
        let upstream_shared_secret = required_non_empty_env("UPSTREAM_SHARED_SECRET")?;
        let upstream_timeout =
            Duration::from_secs(parse_env("UPSTREAM_TIMEOUT_SECONDS", 30_u64)?.max(1));

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            support_session_secret,
            support_session_ttl_hours,
            upstream_api_url,
            upstream_shared_secret,
            upstream_timeout,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}
