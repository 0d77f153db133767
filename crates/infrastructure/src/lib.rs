//! Infrastructure adapters for support access ports.

#![forbid(unsafe_code)]

mod http_upstream_forwarder;
mod in_memory_support_access_store;
mod jwt_session_credential_signer;
mod postgres_access_token_repository;
mod postgres_impersonation_session_repository;
mod postgres_support_audit_repository;
mod postgres_tenant_account_repository;

pub use http_upstream_forwarder::{
    GATEWAY_SECRET_HEADER, HttpUpstreamForwarder, OPERATOR_HEADER, SESSION_HEADER, TENANT_HEADER,
};
pub use in_memory_support_access_store::InMemorySupportAccessStore;
pub use jwt_session_credential_signer::{JwtSessionCredentialSigner, MIN_SESSION_SECRET_LEN};
pub use postgres_access_token_repository::PostgresAccessTokenRepository;
pub use postgres_impersonation_session_repository::PostgresImpersonationSessionRepository;
pub use postgres_support_audit_repository::PostgresSupportAuditRepository;
pub use postgres_tenant_account_repository::PostgresTenantAccountRepository;
