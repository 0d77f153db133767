//! Session Manager: mints and validates operator working sessions.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{AccessToken, ImpersonationSession, SessionEndReason};

use crate::credential_codec;
use crate::support_access_ports::{
    ImpersonationContext, ImpersonationSessionRepository, NewImpersonationSession,
    RequestContext, SessionClaims, SessionCredentialSigner, SessionSummary, StartedSession,
    TenantAccount, TenantAccountRepository,
};
use crate::{AccessTokenService, Clock};

/// Application service for impersonation sessions.
#[derive(Clone)]
pub struct ImpersonationSessionService {
    tokens: AccessTokenService,
    repository: Arc<dyn ImpersonationSessionRepository>,
    tenants: Arc<dyn TenantAccountRepository>,
    signer: Arc<dyn SessionCredentialSigner>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

impl ImpersonationSessionService {
    /// Creates a new session service.
    #[must_use]
    pub fn new(
        tokens: AccessTokenService,
        repository: Arc<dyn ImpersonationSessionRepository>,
        tenants: Arc<dyn TenantAccountRepository>,
        signer: Arc<dyn SessionCredentialSigner>,
        clock: Arc<dyn Clock>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            repository,
            tenants,
            signer,
            clock,
            session_ttl,
        }
    }

    /// Redeems a validated token into a new session.
    ///
    /// Counts the redemption first so that concurrent redemptions cannot pass
    /// `max_uses`.
    pub async fn create_session(
        &self,
        token: &AccessToken,
        tenant: TenantAccount,
        operator_name: &str,
        operator_email: Option<&str>,
        request: RequestContext,
    ) -> AppResult<StartedSession> {
        self.tokens.record_usage(token).await?;

        let now = self.clock.now();
        let session_id = Uuid::new_v4();
        let operator_identifier =
            credential_codec::operator_identifier(operator_name, operator_email, now);
        let expires_at = now + self.session_ttl;

        let raw_credential = self.signer.sign(&SessionClaims {
            session_id,
            token_id: token.id,
            tenant_id: token.tenant_id,
            operator_name: operator_name.to_owned(),
            operator_identifier: operator_identifier.clone(),
            issued_at: now,
            expires_at,
        })?;

        let session = self
            .repository
            .insert_session(NewImpersonationSession {
                id: session_id,
                token_id: token.id,
                tenant_id: token.tenant_id,
                operator_name: operator_name.to_owned(),
                operator_email: operator_email.map(str::to_owned),
                operator_identifier,
                session_token_hash: credential_codec::hash_secret(&raw_credential),
                request,
                started_at: now,
            })
            .await?;

        Ok(StartedSession {
            session,
            raw_credential,
            expires_at,
            scope: token.scope.clone(),
            tenant,
        })
    }

    /// Validates a session credential.
    ///
    /// Re-checks the parent token on every call; a session whose token is no
    /// longer active is ended as a side effect and `None` is returned.
    pub async fn validate_session(
        &self,
        raw_credential: &str,
    ) -> AppResult<Option<ImpersonationContext>> {
        let now = self.clock.now();
        let Some(claims) = self.signer.verify(raw_credential, now) else {
            return Ok(None);
        };

        let session_token_hash = credential_codec::hash_secret(raw_credential);
        let Some(session) = self
            .repository
            .find_active_session_by_hash(&session_token_hash)
            .await?
        else {
            return Ok(None);
        };

        if session.id != claims.session_id || session.token_id != claims.token_id {
            return Ok(None);
        }

        let Some(token) = self.tokens.find(session.tenant_id, session.token_id).await? else {
            return Ok(None);
        };

        if let Some(reason) = SessionEndReason::for_token_status(token.status_at(now)) {
            self.repository.end_session(session.id, reason, now).await?;
            return Ok(None);
        }

        let Some(tenant) = self
            .tenants
            .find_account(session.tenant_id)
            .await?
            .filter(|tenant| tenant.is_active)
        else {
            return Ok(None);
        };

        Ok(Some(ImpersonationContext {
            session,
            token,
            tenant,
        }))
    }

    /// Ends a session in tenant scope. Ending an ended session is a no-op.
    pub async fn end_session(
        &self,
        tenant_id: TenantId,
        session_id: Uuid,
        reason: SessionEndReason,
    ) -> AppResult<ImpersonationSession> {
        let session = self
            .repository
            .find_session(tenant_id, session_id)
            .await?
            .ok_or_else(|| not_found(session_id))?;

        if !session.is_active {
            return Ok(session);
        }

        self.repository
            .end_session(session.id, reason, self.clock.now())
            .await?
            .ok_or_else(|| not_found(session_id))
    }

    /// Ends every active session of a token.
    pub async fn end_all_sessions_for_token(
        &self,
        token_id: Uuid,
        reason: SessionEndReason,
    ) -> AppResult<u64> {
        self.repository
            .end_sessions_for_token(token_id, reason, self.clock.now())
            .await
    }

    /// Lists tenant sessions.
    pub async fn list_sessions(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> AppResult<Vec<SessionSummary>> {
        self.repository.list_sessions(tenant_id, active_only).await
    }
}

fn not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("support session '{session_id}' does not exist"))
}
