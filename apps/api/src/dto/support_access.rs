mod conversions;
mod types;

pub use types::{
    AccessTokenResponse, AuditLogPageResponse, AuthenticateOperatorRequest,
    CreateAccessTokenRequest, EndedSessionResponse, ExtendAccessTokenRequest,
    IssuedAccessTokenResponse, OperatorSessionResponse, RevokeAccessTokenRequest,
    ScopeDescriptorResponse, SessionInfoResponse, SessionResponse, SupportAccessStatsResponse,
};
