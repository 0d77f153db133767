//! PostgreSQL-backed support access token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{
    AccessTokenRepository, AccessTokenUsage, NewAccessToken, TokenExtension, TokenRevocation,
};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{AccessToken, ScopeSet};

mod issue;
mod lifecycle;
mod lookup;


/// Columns selected for every token read.
const ACCESS_TOKEN_COLUMNS: &str = r#"
    id, tenant_id, created_by, token_hash, token_prefix, scope, expires_at,
    original_expires_at, is_active, revoked_at, revoked_by, revoke_reason, use_count,
    max_uses, last_used_at, extension_count, max_extensions, last_extended_at,
    last_extended_by, operator_email, operator_name, purpose, notes, created_at
"#;

/// PostgreSQL implementation of the access token repository port.
#[derive(Clone)]
pub struct PostgresAccessTokenRepository {
    pool: PgPool,
}

impl PostgresAccessTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessTokenRepository for PostgresAccessTokenRepository {
    async fn insert_token(&self, token: NewAccessToken) -> AppResult<AccessToken> {
        self.insert_token_impl(token).await
    }

    async fn find_token_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessToken>> {
        self.find_token_by_hash_impl(token_hash).await
    }

    async fn find_token(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessToken>> {
        self.find_token_impl(tenant_id, token_id).await
    }

    async fn find_token_usage(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessTokenUsage>> {
        self.find_token_usage_impl(tenant_id, token_id).await
    }

    async fn list_token_usage(&self, tenant_id: TenantId) -> AppResult<Vec<AccessTokenUsage>> {
        self.list_token_usage_impl(tenant_id).await
    }

    async fn record_usage(&self, token_id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool> {
        self.record_usage_impl(token_id, used_at).await
    }

    async fn extend_token(&self, extension: TokenExtension) -> AppResult<Option<AccessToken>> {
        self.extend_token_impl(extension).await
    }

    async fn revoke_token(
        &self,
        revocation: TokenRevocation,
    ) -> AppResult<Option<(AccessToken, u64)>> {
        self.revoke_token_impl(revocation).await
    }
}

#[derive(Debug, FromRow)]
struct AccessTokenRow {
    id: Uuid,
    tenant_id: Uuid,
    created_by: String,
    token_hash: String,
    token_prefix: String,
    scope: Vec<String>,
    expires_at: DateTime<Utc>,
    original_expires_at: DateTime<Utc>,
    is_active: bool,
    revoked_at: Option<DateTime<Utc>>,
    revoked_by: Option<String>,
    revoke_reason: Option<String>,
    use_count: i32,
    max_uses: Option<i32>,
    last_used_at: Option<DateTime<Utc>>,
    extension_count: i32,
    max_extensions: i32,
    last_extended_at: Option<DateTime<Utc>>,
    last_extended_by: Option<String>,
    operator_email: Option<String>,
    operator_name: Option<String>,
    purpose: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AccessTokenUsageRow {
    #[sqlx(flatten)]
    token: AccessTokenRow,
    total_sessions: i64,
    active_sessions: i64,
    total_actions: i64,
}

impl TryFrom<AccessTokenRow> for AccessToken {
    type Error = AppError;

    fn try_from(row: AccessTokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            created_by: row.created_by,
            token_hash: row.token_hash,
            token_prefix: row.token_prefix,
            scope: ScopeSet::parse(&row.scope)?,
            expires_at: row.expires_at,
            original_expires_at: row.original_expires_at,
            is_active: row.is_active,
            revoked_at: row.revoked_at,
            revoked_by: row.revoked_by,
            revoke_reason: row.revoke_reason,
            use_count: stored_count(row.use_count, "use_count")?,
            max_uses: row
                .max_uses
                .map(|value| stored_count(value, "max_uses"))
                .transpose()?,
            last_used_at: row.last_used_at,
            extension_count: stored_count(row.extension_count, "extension_count")?,
            max_extensions: stored_count(row.max_extensions, "max_extensions")?,
            last_extended_at: row.last_extended_at,
            last_extended_by: row.last_extended_by,
            operator_email: row.operator_email,
            operator_name: row.operator_name,
            purpose: row.purpose,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<AccessTokenUsageRow> for AccessTokenUsage {
    type Error = AppError;

    fn try_from(row: AccessTokenUsageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            token: AccessToken::try_from(row.token)?,
            total_sessions: stored_total(row.total_sessions),
            active_sessions: stored_total(row.active_sessions),
            total_actions: stored_total(row.total_actions),
        })
    }
}

fn stored_count(value: i32, column: &str) -> AppResult<u32> {
    u32::try_from(value).map_err(|error| {
        AppError::Internal(format!(
            "support access token column '{column}' holds invalid value {value}: {error}"
        ))
    })
}

fn stored_total(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn to_stored_count(value: u32, column: &str) -> AppResult<i32> {
    i32::try_from(value).map_err(|error| {
        AppError::Internal(format!(
            "support access token column '{column}' cannot store {value}: {error}"
        ))
    })
}
