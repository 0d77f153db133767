use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Incoming payload for issuing a support access token.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-access-token-request.ts"
)]
pub struct CreateAccessTokenRequest {
    pub scope: Vec<String>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub operator_email: Option<String>,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Incoming payload for extending a token.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/extend-access-token-request.ts"
)]
pub struct ExtendAccessTokenRequest {
    #[serde(default)]
    pub additional_hours: Option<u32>,
}

/// Incoming payload for revoking a token.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/revoke-access-token-request.ts"
)]
pub struct RevokeAccessTokenRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Incoming payload for operator authentication.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/authenticate-operator-request.ts"
)]
pub struct AuthenticateOperatorRequest {
    pub token: String,
    pub operator_name: String,
    #[serde(default)]
    pub operator_email: Option<String>,
}

/// API representation of a support access token.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-token-response.ts"
)]
pub struct AccessTokenResponse {
    pub id: String,
    pub token_prefix: String,
    pub scope: Vec<String>,
    pub status: String,
    pub expires_at: String,
    pub original_expires_at: String,
    pub created_by: String,
    pub created_at: String,
    pub revoked_at: Option<String>,
    pub revoked_by: Option<String>,
    pub revoke_reason: Option<String>,
    pub use_count: u32,
    pub max_uses: Option<u32>,
    pub last_used_at: Option<String>,
    pub extension_count: u32,
    pub extensions_remaining: u32,
    pub last_extended_at: Option<String>,
    pub operator_email: Option<String>,
    pub operator_name: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub total_actions: u64,
}

/// Freshly issued token, the only response that carries the raw secret.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/issued-access-token-response.ts"
)]
pub struct IssuedAccessTokenResponse {
    pub id: String,
    pub token: String,
    pub token_prefix: String,
    pub scope: Vec<String>,
    pub expires_at: String,
    pub max_uses: Option<u32>,
    pub operator_email: Option<String>,
    pub operator_name: Option<String>,
    pub purpose: Option<String>,
    pub extensions_remaining: u32,
    pub created_at: String,
}

/// API representation of an impersonation session.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-session-response.ts"
)]
pub struct SessionResponse {
    pub id: String,
    pub token_id: String,
    pub token_prefix: String,
    pub token_purpose: Option<String>,
    pub operator_name: String,
    pub operator_email: Option<String>,
    pub operator_identifier: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub end_reason: Option<String>,
    pub is_active: bool,
    pub actions_count: u32,
    pub last_action_at: Option<String>,
}

/// Result of ending a session.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ended-session-response.ts"
)]
pub struct EndedSessionResponse {
    pub session_id: String,
    pub ended_at: Option<String>,
    pub end_reason: Option<String>,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-audit-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub id: String,
    pub session_id: String,
    pub token_id: String,
    pub action_type: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    #[ts(type = "unknown")]
    pub action_details: Option<Value>,
    pub endpoint: Option<String>,
    pub http_method: Option<String>,
    #[ts(type = "unknown")]
    pub request_body_summary: Option<Value>,
    pub response_status: Option<u16>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
    pub operator_name: String,
    pub operator_email: Option<String>,
    pub token_prefix: String,
    pub token_purpose: Option<String>,
}

/// One page of the support audit log.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-audit-page-response.ts"
)]
pub struct AuditLogPageResponse {
    pub entries: Vec<AuditLogEntryResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

/// Aggregate support access counters.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-access-stats-response.ts"
)]
pub struct SupportAccessStatsResponse {
    pub active_tokens: u64,
    pub active_sessions: u64,
    pub actions_last_30_days: u64,
    pub sessions_last_30_days: u64,
}

/// Impersonated tenant identity.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-tenant-response.ts"
)]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Session credential returned to an operator after authentication.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/operator-session-response.ts"
)]
pub struct OperatorSessionResponse {
    pub session_token: String,
    pub session_id: String,
    pub expires_at: String,
    pub scope: Vec<String>,
    pub tenant: TenantResponse,
    pub operator_name: String,
    pub operator_identifier: String,
}

/// Context of the caller's own impersonation session.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-session-info-response.ts"
)]
pub struct SessionInfoResponse {
    pub session_id: String,
    pub tenant: TenantResponse,
    pub scope: Vec<String>,
    pub operator_name: String,
    pub operator_email: Option<String>,
    pub operator_identifier: String,
    pub started_at: String,
    pub actions_count: u32,
    pub token_expires_at: String,
}

/// Scope catalog entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/support-scope-response.ts"
)]
pub struct ScopeDescriptorResponse {
    pub scope: String,
    pub label: String,
    pub description: String,
}
