//! Application services and ports.

#![forbid(unsafe_code)]

mod access_token_service;
mod auth_context;
mod clock;
pub mod credential_codec;
mod impersonation_session_service;
mod inactive_session_sweeper;
mod operator_access_service;
mod support_access_admin_service;
mod support_access_gateway;
mod support_access_ports;
mod support_audit_service;
#[cfg(test)]
mod test_support;

pub use access_token_service::AccessTokenService;
pub use auth_context::AuthContext;
pub use clock::{Clock, SystemClock};
pub use impersonation_session_service::ImpersonationSessionService;
pub use inactive_session_sweeper::InactiveSessionSweeper;
pub use operator_access_service::OperatorAccessService;
pub use support_access_admin_service::SupportAccessAdminService;
pub use support_access_gateway::{GatewayOutcome, ImpersonatedRequest, SupportAccessGateway};
pub use support_access_ports::{
    AccessTokenOptions, AccessTokenRepository, AccessTokenSummary, AccessTokenUsage,
    AuditLogPage, AuditLogQuery, AuditLogRecord, AuditedAction, CreateAccessTokenInput,
    ImpersonationContext, ImpersonationSessionRepository, IssuedAccessToken, NewAccessToken,
    NewAuditEntry, NewImpersonationSession, OperatorAuthenticationInput, RequestContext,
    ScopeDescriptor, SessionClaims, SessionCredentialSigner, SessionSummary, StartedSession,
    SupportAccessStats, SupportAuditRepository, TenantAccount, TenantAccountRepository,
    TokenExtension, TokenRevocation, UpstreamForwarder, UpstreamRequest, UpstreamResponse,
};
pub use support_audit_service::SupportAuditService;
