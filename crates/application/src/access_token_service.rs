//! Token Store: issuance, validation and lifecycle of support access tokens.

use std::sync::Arc;

use uuid::Uuid;
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{AccessToken, AccessTokenPolicy, ScopeSet, SessionEndReason, TokenStatus};

use crate::Clock;
use crate::credential_codec;
use crate::support_access_ports::{
    AccessTokenOptions, AccessTokenRepository, AccessTokenSummary, IssuedAccessToken,
    NewAccessToken, TenantAccount, TenantAccountRepository, TokenExtension, TokenRevocation,
};

/// Application service owning the access token lifecycle.
#[derive(Clone)]
pub struct AccessTokenService {
    repository: Arc<dyn AccessTokenRepository>,
    tenants: Arc<dyn TenantAccountRepository>,
    clock: Arc<dyn Clock>,
    policy: AccessTokenPolicy,
}

impl AccessTokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AccessTokenRepository>,
        tenants: Arc<dyn TenantAccountRepository>,
        clock: Arc<dyn Clock>,
        policy: AccessTokenPolicy,
    ) -> Self {
        Self {
            repository,
            tenants,
            clock,
            policy,
        }
    }

    /// Returns the policy applied to issuance and extension.
    #[must_use]
    pub fn policy(&self) -> &AccessTokenPolicy {
        &self.policy
    }

    /// Issues a token and returns the raw secret exactly once.
    ///
    /// The duration is clamped to the policy bounds.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        issued_by: &str,
        scope: ScopeSet,
        duration_hours: Option<u32>,
        options: AccessTokenOptions,
    ) -> AppResult<IssuedAccessToken> {
        let generated = credential_codec::generate_secret()?;
        let now = self.clock.now();
        let hours = self.policy.clamp_duration_hours(duration_hours);

        let token = self
            .repository
            .insert_token(NewAccessToken {
                id: Uuid::new_v4(),
                tenant_id,
                created_by: issued_by.to_owned(),
                token_hash: generated.hash,
                token_prefix: generated.prefix,
                scope,
                expires_at: now + chrono::Duration::hours(i64::from(hours)),
                max_extensions: self.policy.max_extensions,
                options,
                created_at: now,
            })
            .await?;

        Ok(IssuedAccessToken {
            token,
            raw_secret: generated.secret,
        })
    }

    /// Resolves a raw secret to a redeemable token, or the reason it is not.
    ///
    /// Has no side effects.
    pub async fn verify(&self, raw_secret: &str) -> AppResult<(AccessToken, TenantAccount)> {
        if !credential_codec::is_well_formed(raw_secret.trim()) {
            return Err(AppError::InvalidCredential(
                "support access token is malformed".to_owned(),
            ));
        }

        let token_hash = credential_codec::hash_secret(raw_secret.trim());
        let token = self
            .repository
            .find_token_by_hash(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::InvalidCredential("support access token is not recognized".to_owned())
            })?;

        token.ensure_redeemable(self.clock.now())?;

        let tenant = self
            .tenants
            .find_account(token.tenant_id)
            .await?
            .filter(|tenant| tenant.is_active)
            .ok_or_else(|| {
                AppError::InvalidCredential(
                    "support access token belongs to an inactive account".to_owned(),
                )
            })?;

        Ok((token, tenant))
    }

    /// Returns the token for a raw secret, or `None` when it cannot be redeemed.
    pub async fn validate(&self, raw_secret: &str) -> AppResult<Option<AccessToken>> {
        match self.verify(raw_secret).await {
            Ok((token, _)) => Ok(Some(token)),
            Err(error) if error.is_credential_rejection() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Counts one redemption of the token into a session.
    pub async fn record_usage(&self, token: &AccessToken) -> AppResult<()> {
        let recorded = self
            .repository
            .record_usage(token.id, self.clock.now())
            .await?;

        if !recorded {
            return Err(AppError::UsageExhausted(format!(
                "support access token '{}' reached its usage limit",
                token.token_prefix
            )));
        }

        Ok(())
    }

    /// Finds a token in tenant scope.
    pub async fn find(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessToken>> {
        self.repository.find_token(tenant_id, token_id).await
    }

    /// Returns a token in tenant scope.
    pub async fn get(&self, tenant_id: TenantId, token_id: Uuid) -> AppResult<AccessToken> {
        self.find(tenant_id, token_id)
            .await?
            .ok_or_else(|| not_found(token_id))
    }

    /// Returns a token projection with counters.
    pub async fn get_summary(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<AccessTokenSummary> {
        let usage = self
            .repository
            .find_token_usage(tenant_id, token_id)
            .await?
            .ok_or_else(|| not_found(token_id))?;

        Ok(AccessTokenSummary::from_usage(usage, self.clock.now()))
    }

    /// Lists token projections. Expired tokens are hidden unless requested;
    /// revoked tokens are always listed.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        include_expired: bool,
    ) -> AppResult<Vec<AccessTokenSummary>> {
        let now = self.clock.now();
        let summaries = self
            .repository
            .list_token_usage(tenant_id)
            .await?
            .into_iter()
            .map(|usage| AccessTokenSummary::from_usage(usage, now))
            .filter(|summary| include_expired || summary.status != TokenStatus::Expired)
            .collect();

        Ok(summaries)
    }

    /// Extends the token expiry, bounded by the extension count and hard cap.
    pub async fn extend(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
        additional_hours: Option<u32>,
        extended_by: &str,
    ) -> AppResult<AccessToken> {
        let additional_hours = self.policy.resolve_extension_hours(additional_hours)?;
        let token = self.get(tenant_id, token_id).await?;
        let now = self.clock.now();
        self.policy.ensure_extendable(&token, now)?;

        let expires_at = self.policy.extended_expiry(
            token.expires_at,
            token.original_expires_at,
            additional_hours,
        );

        self.repository
            .extend_token(TokenExtension {
                token_id,
                tenant_id,
                expires_at,
                extended_by: extended_by.to_owned(),
                extended_at: now,
            })
            .await?
            .ok_or_else(|| {
                AppError::LimitExceeded(format!(
                    "maximum number of extensions reached ({})",
                    token.max_extensions
                ))
            })
    }

    /// Revokes the token and ends all of its active sessions before returning.
    ///
    /// Revoking an already revoked token returns it unchanged.
    pub async fn revoke(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
        revoked_by: &str,
        reason: Option<String>,
    ) -> AppResult<AccessToken> {
        let token = self.get(tenant_id, token_id).await?;
        if token.revoked_at.is_some() {
            return Ok(token);
        }

        let (token, _ended_sessions) = self
            .repository
            .revoke_token(TokenRevocation {
                token_id,
                tenant_id,
                revoked_by: revoked_by.to_owned(),
                reason,
                revoked_at: self.clock.now(),
                session_end_reason: SessionEndReason::TokenRevoked,
            })
            .await?
            .ok_or_else(|| not_found(token_id))?;

        Ok(token)
    }
}

fn not_found(token_id: Uuid) -> AppError {
    AppError::NotFound(format!("support access token '{token_id}' does not exist"))
}
