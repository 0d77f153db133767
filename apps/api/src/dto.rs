use serde::Serialize;
use ts_rs::TS;

mod support_access;

pub use support_access::{
    AccessTokenResponse, AuditLogPageResponse, AuthenticateOperatorRequest,
    CreateAccessTokenRequest, EndedSessionResponse, ExtendAccessTokenRequest,
    IssuedAccessTokenResponse, OperatorSessionResponse, RevokeAccessTokenRequest,
    ScopeDescriptorResponse, SessionInfoResponse, SessionResponse, SupportAccessStatsResponse,
};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}
