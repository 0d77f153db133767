//! Administrative Façade for tenant admins managing support access.

use uuid::Uuid;
use warden_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use warden_domain::{ImpersonationSession, ScopeSet, SessionEndReason};

use crate::support_access_ports::{
    AccessTokenOptions, AccessTokenSummary, AuditLogPage, AuditLogQuery, CreateAccessTokenInput,
    IssuedAccessToken, SessionSummary, SupportAccessStats,
};
use crate::{AccessTokenService, ImpersonationSessionService, SupportAuditService};

/// Application service exposing support access administration to tenant admins.
#[derive(Clone)]
pub struct SupportAccessAdminService {
    tokens: AccessTokenService,
    sessions: ImpersonationSessionService,
    audit: SupportAuditService,
}

impl SupportAccessAdminService {
    /// Creates a new administration service.
    #[must_use]
    pub fn new(
        tokens: AccessTokenService,
        sessions: ImpersonationSessionService,
        audit: SupportAuditService,
    ) -> Self {
        Self {
            tokens,
            sessions,
            audit,
        }
    }

    /// Issues a token after validating scope and duration.
    pub async fn create_token(
        &self,
        actor: &UserIdentity,
        input: CreateAccessTokenInput,
    ) -> AppResult<IssuedAccessToken> {
        require_admin(actor)?;

        let scope = ScopeSet::parse(&input.scope)?;
        self.tokens
            .policy()
            .validate_duration_hours(input.duration_hours)?;

        if input.max_uses == Some(0) {
            return Err(AppError::Validation(
                "max uses must be at least 1".to_owned(),
            ));
        }

        let options = AccessTokenOptions {
            max_uses: input.max_uses,
            operator_email: optional_text(input.operator_email)
                .map(|email| email.to_lowercase()),
            operator_name: optional_text(input.operator_name),
            purpose: optional_text(input.purpose),
            notes: optional_text(input.notes),
        };

        self.tokens
            .create(
                actor.tenant_id(),
                actor.subject(),
                scope,
                input.duration_hours,
                options,
            )
            .await
    }

    /// Lists tenant tokens.
    pub async fn list_tokens(
        &self,
        actor: &UserIdentity,
        include_expired: bool,
    ) -> AppResult<Vec<AccessTokenSummary>> {
        require_admin(actor)?;
        self.tokens.list(actor.tenant_id(), include_expired).await
    }

    /// Returns one tenant token.
    pub async fn get_token(
        &self,
        actor: &UserIdentity,
        token_id: Uuid,
    ) -> AppResult<AccessTokenSummary> {
        require_admin(actor)?;
        self.tokens.get_summary(actor.tenant_id(), token_id).await
    }

    /// Extends a tenant token.
    pub async fn extend_token(
        &self,
        actor: &UserIdentity,
        token_id: Uuid,
        additional_hours: Option<u32>,
    ) -> AppResult<AccessTokenSummary> {
        require_admin(actor)?;
        self.tokens
            .extend(actor.tenant_id(), token_id, additional_hours, actor.subject())
            .await?;
        self.tokens.get_summary(actor.tenant_id(), token_id).await
    }

    /// Revokes a tenant token and every active session bound to it.
    pub async fn revoke_token(
        &self,
        actor: &UserIdentity,
        token_id: Uuid,
        reason: Option<String>,
    ) -> AppResult<AccessTokenSummary> {
        require_admin(actor)?;
        self.tokens
            .revoke(
                actor.tenant_id(),
                token_id,
                actor.subject(),
                optional_text(reason),
            )
            .await?;
        self.tokens.get_summary(actor.tenant_id(), token_id).await
    }

    /// Lists tenant sessions.
    pub async fn list_sessions(
        &self,
        actor: &UserIdentity,
        active_only: bool,
    ) -> AppResult<Vec<SessionSummary>> {
        require_admin(actor)?;
        self.sessions
            .list_sessions(actor.tenant_id(), active_only)
            .await
    }

    /// Terminates a tenant session.
    pub async fn end_session(
        &self,
        actor: &UserIdentity,
        session_id: Uuid,
    ) -> AppResult<ImpersonationSession> {
        require_admin(actor)?;
        self.sessions
            .end_session(
                actor.tenant_id(),
                session_id,
                SessionEndReason::AdminTerminated,
            )
            .await
    }

    /// Returns one page of the tenant audit log.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<AuditLogPage> {
        require_admin(actor)?;
        self.audit.list(actor.tenant_id(), query).await
    }

    /// Returns aggregate support access counters.
    pub async fn stats(&self, actor: &UserIdentity) -> AppResult<SupportAccessStats> {
        require_admin(actor)?;
        self.audit.stats(actor.tenant_id()).await
    }
}

fn require_admin(actor: &UserIdentity) -> AppResult<()> {
    if actor.role().is_admin() {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "subject '{}' is not allowed to manage support access",
        actor.subject()
    )))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .and_then(|value| NonEmptyString::new(value).ok())
        .map(String::from)
}
