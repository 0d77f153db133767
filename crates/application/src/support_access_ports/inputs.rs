use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;
use warden_core::TenantId;
use warden_domain::{ResourceRef, ResourceType, ScopeSet, SessionEndReason, SupportActionType};

/// Admin request payload for issuing a support access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAccessTokenInput {
    /// Requested scope storage values.
    pub scope: Vec<String>,
    /// Requested duration in hours.
    pub duration_hours: Option<u32>,
    /// Optional redemption cap.
    pub max_uses: Option<u32>,
    /// Operator email the token is restricted to.
    pub operator_email: Option<String>,
    /// Declared operator name.
    pub operator_name: Option<String>,
    /// Free-text purpose.
    pub purpose: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Optional attributes of a token beyond scope and duration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTokenOptions {
    /// Optional redemption cap.
    pub max_uses: Option<u32>,
    /// Operator email the token is restricted to.
    pub operator_email: Option<String>,
    /// Declared operator name.
    pub operator_name: Option<String>,
    /// Free-text purpose.
    pub purpose: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Token row to persist at issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessToken {
    /// Stable token id.
    pub id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Issuing admin subject.
    pub created_by: String,
    /// SHA-256 digest of the raw secret.
    pub token_hash: String,
    /// Display prefix.
    pub token_prefix: String,
    /// Granted scopes.
    pub scope: ScopeSet,
    /// Expiry, also stored as the original expiry.
    pub expires_at: DateTime<Utc>,
    /// Maximum allowed extensions.
    pub max_extensions: u32,
    /// Issuance attributes.
    pub options: AccessTokenOptions,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Guarded expiry extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExtension {
    /// Token to extend.
    pub token_id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// New expiry.
    pub expires_at: DateTime<Utc>,
    /// Admin subject applying the extension.
    pub extended_by: String,
    /// Extension timestamp.
    pub extended_at: DateTime<Utc>,
}

/// Terminal revocation applied together with the session cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRevocation {
    /// Token to revoke.
    pub token_id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Admin subject revoking the token.
    pub revoked_by: String,
    /// Free-text reason.
    pub reason: Option<String>,
    /// Revocation timestamp, also used as session end time.
    pub revoked_at: DateTime<Utc>,
    /// Reason written on cascaded sessions.
    pub session_end_reason: SessionEndReason,
}

/// Session row to persist when a token is redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImpersonationSession {
    /// Stable session id.
    pub id: Uuid,
    /// Parent token.
    pub token_id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Self-reported operator name.
    pub operator_name: String,
    /// Self-reported operator email.
    pub operator_email: Option<String>,
    /// Derived operator fingerprint.
    pub operator_identifier: String,
    /// SHA-256 digest of the session credential.
    pub session_token_hash: String,
    /// Client request context.
    pub request: RequestContext,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
}

/// Client metadata captured from an HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client IP.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// Operator request payload for redeeming a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorAuthenticationInput {
    /// Raw access token secret.
    pub token: String,
    /// Self-reported operator name.
    pub operator_name: String,
    /// Self-reported operator email.
    pub operator_email: Option<String>,
}

/// Action observed by the gateway, before redaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditedAction {
    /// Kind of action.
    pub action_type: SupportActionType,
    /// Resolved resource.
    pub resource: ResourceRef,
    /// Structured details such as path and query.
    pub action_details: Option<Value>,
    /// Requested endpoint.
    pub endpoint: Option<String>,
    /// HTTP method.
    pub http_method: Option<String>,
    /// Raw request body.
    pub request_body: Option<Value>,
    /// Response status returned to the operator.
    pub response_status: Option<u16>,
    /// Client request context.
    pub request: RequestContext,
    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditedAction {
    /// Builds a session lifecycle action with no HTTP payload.
    #[must_use]
    pub fn session_lifecycle(
        action_type: SupportActionType,
        session_id: Uuid,
        request: RequestContext,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action_type,
            resource: ResourceRef {
                resource_type: ResourceType::Session,
                resource_id: Some(session_id.to_string()),
                resource_name: None,
            },
            action_details: None,
            endpoint: None,
            http_method: None,
            request_body: None,
            response_status: None,
            request,
            occurred_at,
        }
    }
}

/// Redacted audit row to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    /// Stable entry id.
    pub id: Uuid,
    /// Session that performed the action.
    pub session_id: Uuid,
    /// Parent token.
    pub token_id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Kind of action.
    pub action_type: SupportActionType,
    /// Resolved resource.
    pub resource: ResourceRef,
    /// Redacted structured details.
    pub action_details: Option<Value>,
    /// Requested endpoint.
    pub endpoint: Option<String>,
    /// HTTP method.
    pub http_method: Option<String>,
    /// Redacted request body summary.
    pub request_body_summary: Option<Value>,
    /// Response status.
    pub response_status: Option<u16>,
    /// Client request context.
    pub request: RequestContext,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Filters for the tenant audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Session filter.
    pub session_id: Option<Uuid>,
    /// Token filter.
    pub token_id: Option<Uuid>,
    /// Action type filter.
    pub action_type: Option<SupportActionType>,
    /// Resource type filter.
    pub resource_type: Option<ResourceType>,
    /// Inclusive lower bound on creation time.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub end_date: Option<DateTime<Utc>>,
    /// Page size.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u32,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            session_id: None,
            token_id: None,
            action_type: None,
            resource_type: None,
            start_date: None,
            end_date: None,
            limit: AuditLogQuery::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl AuditLogQuery {
    /// Page size used when none is requested.
    pub const DEFAULT_LIMIT: u32 = 100;
    /// Largest page size served.
    pub const MAX_LIMIT: u32 = 500;

    /// Returns the query with its page size clamped to `[1, MAX_LIMIT]`.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.limit = self.limit.clamp(1, Self::MAX_LIMIT);
        self
    }
}
