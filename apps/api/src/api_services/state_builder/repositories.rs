use std::sync::Arc;

use sqlx::PgPool;
use warden_application::SystemClock;
use warden_core::AppError;
use warden_infrastructure::{
    HttpUpstreamForwarder, JwtSessionCredentialSigner, PostgresAccessTokenRepository,
    PostgresImpersonationSessionRepository, PostgresSupportAuditRepository,
    PostgresTenantAccountRepository,
};

use crate::api_config::ApiConfig;

use super::SupportAccessPorts;

pub fn postgres_ports(pool: &PgPool, config: &ApiConfig) -> Result<SupportAccessPorts, AppError> {
    Ok(SupportAccessPorts {
        tokens: Arc::new(PostgresAccessTokenRepository::new(pool.clone())),
        sessions: Arc::new(PostgresImpersonationSessionRepository::new(pool.clone())),
        audit: Arc::new(PostgresSupportAuditRepository::new(pool.clone())),
        tenants: Arc::new(PostgresTenantAccountRepository::new(pool.clone())),
        signer: Arc::new(JwtSessionCredentialSigner::new(
            config.support_session_secret.as_str(),
        )?),
        forwarder: Arc::new(HttpUpstreamForwarder::new(
            config.upstream_api_url.as_str(),
            config.upstream_shared_secret.clone(),
            config.upstream_timeout,
        )?),
        clock: Arc::new(SystemClock),
    })
}
