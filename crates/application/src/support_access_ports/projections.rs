use chrono::{DateTime, Utc};
use warden_core::TenantId;
use warden_domain::{
    AccessToken, ImpersonationSession, ScopeSet, SupportAuditEntry, SupportScope, TokenStatus,
};

/// Tenant account fields needed by support access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantAccount {
    /// Tenant id.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Whether the account can be accessed.
    pub is_active: bool,
}

/// Token with session and action counters, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenUsage {
    /// Token record.
    pub token: AccessToken,
    /// Sessions ever opened from the token.
    pub total_sessions: u64,
    /// Sessions currently active.
    pub active_sessions: u64,
    /// Audit entries recorded under the token.
    pub total_actions: u64,
}

/// Token projection returned to tenant admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenSummary {
    /// Token record.
    pub token: AccessToken,
    /// Derived status.
    pub status: TokenStatus,
    /// Sessions ever opened from the token.
    pub total_sessions: u64,
    /// Sessions currently active.
    pub active_sessions: u64,
    /// Audit entries recorded under the token.
    pub total_actions: u64,
}

impl AccessTokenSummary {
    /// Builds the projection with a status evaluated at `now`.
    #[must_use]
    pub fn from_usage(usage: AccessTokenUsage, now: DateTime<Utc>) -> Self {
        Self {
            status: usage.token.status_at(now),
            token: usage.token,
            total_sessions: usage.total_sessions,
            active_sessions: usage.active_sessions,
            total_actions: usage.total_actions,
        }
    }
}

/// Freshly issued token, carrying the raw secret exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccessToken {
    /// Persisted token record.
    pub token: AccessToken,
    /// Raw secret, never persisted.
    pub raw_secret: String,
}

/// Session projection with parent token details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session record.
    pub session: ImpersonationSession,
    /// Parent token display prefix.
    pub token_prefix: String,
    /// Parent token purpose.
    pub token_purpose: Option<String>,
}

/// Result of redeeming a token into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    /// Persisted session record.
    pub session: ImpersonationSession,
    /// Signed session credential, never persisted.
    pub raw_credential: String,
    /// Credential expiry.
    pub expires_at: DateTime<Utc>,
    /// Scope granted by the parent token.
    pub scope: ScopeSet,
    /// Impersonated tenant.
    pub tenant: TenantAccount,
}

/// Validated impersonation session with its parent token and tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationContext {
    /// Active session.
    pub session: ImpersonationSession,
    /// Parent token, active at validation time.
    pub token: AccessToken,
    /// Impersonated tenant.
    pub tenant: TenantAccount,
}

impl ImpersonationContext {
    /// Returns the scopes granted to the session.
    #[must_use]
    pub fn scope(&self) -> &ScopeSet {
        &self.token.scope
    }

    /// Returns the impersonated tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.session.tenant_id
    }
}

/// Audit entry projection with session and token details.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogRecord {
    /// Audit entry.
    pub entry: SupportAuditEntry,
    /// Operator that acted.
    pub operator_name: String,
    /// Operator email, when declared.
    pub operator_email: Option<String>,
    /// Parent token display prefix.
    pub token_prefix: String,
    /// Parent token purpose.
    pub token_purpose: Option<String>,
}

/// One page of the audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogPage {
    /// Entries, newest first.
    pub entries: Vec<AuditLogRecord>,
    /// Total matching entries.
    pub total: u64,
    /// Page size used.
    pub limit: u32,
    /// Rows skipped.
    pub offset: u32,
}

impl AuditLogPage {
    /// Returns whether more entries exist after this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + u64::from(self.limit) < self.total
    }
}

/// Aggregate support access counters for a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupportAccessStats {
    /// Tokens currently redeemable.
    pub active_tokens: u64,
    /// Sessions currently active.
    pub active_sessions: u64,
    /// Audit entries in the trailing 30 days.
    pub actions_last_30_days: u64,
    /// Sessions started in the trailing 30 days.
    pub sessions_last_30_days: u64,
}

/// Scope catalog entry for UI rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeDescriptor {
    /// Scope.
    pub scope: SupportScope,
    /// Human label.
    pub label: &'static str,
    /// One-line description.
    pub description: &'static str,
}
