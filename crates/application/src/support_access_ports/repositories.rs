use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_core::{AppResult, TenantId};
use warden_domain::{AccessToken, ImpersonationSession, SessionEndReason, SupportAuditEntry};

use super::inputs::{
    AuditLogQuery, NewAccessToken, NewAuditEntry, NewImpersonationSession, TokenExtension,
    TokenRevocation,
};
use super::projections::{
    AccessTokenUsage, AuditLogPage, SessionSummary, SupportAccessStats, TenantAccount,
};

/// Repository port for support access tokens.
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// Persists a newly issued token.
    async fn insert_token(&self, token: NewAccessToken) -> AppResult<AccessToken>;

    /// Finds a token by the digest of its secret.
    async fn find_token_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessToken>>;

    /// Finds a token in tenant scope.
    async fn find_token(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessToken>>;

    /// Finds a token with its counters in tenant scope.
    async fn find_token_usage(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessTokenUsage>>;

    /// Lists tenant tokens with counters, newest first.
    async fn list_token_usage(&self, tenant_id: TenantId) -> AppResult<Vec<AccessTokenUsage>>;

    /// Atomically increments the redemption counter.
    ///
    /// Returns `false` when the token already reached `max_uses`.
    async fn record_usage(&self, token_id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool>;

    /// Applies an extension unless the token is revoked or at its extension cap.
    ///
    /// Returns `None` when the guard rejected the update.
    async fn extend_token(&self, extension: TokenExtension) -> AppResult<Option<AccessToken>>;

    /// Ends every active session of the token and marks it revoked, atomically.
    ///
    /// Returns the revoked token and the number of sessions ended.
    async fn revoke_token(
        &self,
        revocation: TokenRevocation,
    ) -> AppResult<Option<(AccessToken, u64)>>;
}

/// Repository port for impersonation sessions.
#[async_trait]
pub trait ImpersonationSessionRepository: Send + Sync {
    /// Persists a new session.
    async fn insert_session(
        &self,
        session: NewImpersonationSession,
    ) -> AppResult<ImpersonationSession>;

    /// Finds an active session by the digest of its credential.
    async fn find_active_session_by_hash(
        &self,
        session_token_hash: &str,
    ) -> AppResult<Option<ImpersonationSession>>;

    /// Finds a session in tenant scope.
    async fn find_session(
        &self,
        tenant_id: TenantId,
        session_id: Uuid,
    ) -> AppResult<Option<ImpersonationSession>>;

    /// Lists tenant sessions with parent token details, newest first.
    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> AppResult<Vec<SessionSummary>>;

    /// Ends one session if still active and returns its current state.
    async fn end_session(
        &self,
        session_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<ImpersonationSession>>;

    /// Ends every active session of a token.
    async fn end_sessions_for_token(
        &self,
        token_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Ends active sessions whose last activity is older than `idle_before`.
    async fn end_inactive_sessions(
        &self,
        idle_before: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64>;
}

/// Repository port for the support audit log.
#[async_trait]
pub trait SupportAuditRepository: Send + Sync {
    /// Appends an entry and bumps the session action counters.
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<SupportAuditEntry>;

    /// Returns one filtered page of tenant entries, newest first.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: &AuditLogQuery,
    ) -> AppResult<AuditLogPage>;

    /// Returns aggregate counters evaluated at `now` over the window starting at `since`.
    async fn access_stats(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
        since: DateTime<Utc>,
    ) -> AppResult<SupportAccessStats>;
}

/// Port for reading tenant accounts.
#[async_trait]
pub trait TenantAccountRepository: Send + Sync {
    /// Finds a tenant account.
    async fn find_account(&self, tenant_id: TenantId) -> AppResult<Option<TenantAccount>>;
}
