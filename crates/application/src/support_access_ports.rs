mod credentials;
mod inputs;
mod projections;
mod repositories;
mod upstream;

pub use credentials::{SessionClaims, SessionCredentialSigner};
pub use inputs::{
    AccessTokenOptions, AuditLogQuery, AuditedAction, CreateAccessTokenInput, NewAccessToken,
    NewAuditEntry, NewImpersonationSession, OperatorAuthenticationInput, RequestContext,
    TokenExtension, TokenRevocation,
};
pub use projections::{
    AccessTokenSummary, AccessTokenUsage, AuditLogPage, AuditLogRecord, ImpersonationContext,
    IssuedAccessToken, ScopeDescriptor, SessionSummary, StartedSession, SupportAccessStats,
    TenantAccount,
};
pub use repositories::{
    AccessTokenRepository, ImpersonationSessionRepository, SupportAuditRepository,
    TenantAccountRepository,
};
pub use upstream::{UpstreamForwarder, UpstreamRequest, UpstreamResponse};
