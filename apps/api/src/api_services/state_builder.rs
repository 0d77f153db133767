use std::sync::Arc;

use warden_application::{
    AccessTokenRepository, AccessTokenService, Clock, ImpersonationSessionRepository,
    ImpersonationSessionService, OperatorAccessService, SessionCredentialSigner,
    SupportAccessAdminService, SupportAccessGateway, SupportAuditRepository, SupportAuditService,
    TenantAccountRepository, UpstreamForwarder,
};
use warden_core::AppError;
use warden_domain::{AccessTokenPolicy, ForbiddenActionGuard};

use crate::state::AppState;

mod repositories;

pub use repositories::postgres_ports;

/// Port implementations the support access services are wired from.
pub struct SupportAccessPorts {
    pub tokens: Arc<dyn AccessTokenRepository>,
    pub sessions: Arc<dyn ImpersonationSessionRepository>,
    pub audit: Arc<dyn SupportAuditRepository>,
    pub tenants: Arc<dyn TenantAccountRepository>,
    pub signer: Arc<dyn SessionCredentialSigner>,
    pub forwarder: Arc<dyn UpstreamForwarder>,
    pub clock: Arc<dyn Clock>,
}

pub fn build_app_state(
    ports: SupportAccessPorts,
    session_ttl_hours: u32,
) -> Result<AppState, AppError> {
    let token_service = AccessTokenService::new(
        ports.tokens,
        ports.tenants.clone(),
        ports.clock.clone(),
        AccessTokenPolicy::default(),
    );
    let session_service = ImpersonationSessionService::new(
        token_service.clone(),
        ports.sessions,
        ports.tenants,
        ports.signer,
        ports.clock.clone(),
        chrono::Duration::hours(i64::from(session_ttl_hours)),
    );
    let audit_service = SupportAuditService::new(ports.audit, ports.clock.clone());

    Ok(AppState {
        admin_service: SupportAccessAdminService::new(
            token_service.clone(),
            session_service.clone(),
            audit_service.clone(),
        ),
        operator_service: OperatorAccessService::new(token_service, session_service.clone()),
        gateway: SupportAccessGateway::new(
            session_service,
            ports.forwarder,
            ForbiddenActionGuard::new()?,
            ports.clock.clone(),
        ),
        audit_service,
        clock: ports.clock,
    })
}
