//! PostgreSQL-backed impersonation session repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{ImpersonationSessionRepository, NewImpersonationSession, SessionSummary};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{ImpersonationSession, SessionEndReason};

const SESSION_COLUMNS: &str = r#"
    id, token_id, tenant_id, operator_name, operator_email, operator_identifier,
    session_token_hash, ip_address, user_agent, started_at, ended_at, end_reason,
    is_active, actions_count, last_action_at
"#;

/// PostgreSQL implementation of the impersonation session repository port.
#[derive(Clone)]
pub struct PostgresImpersonationSessionRepository {
    pool: PgPool,
}

impl PostgresImpersonationSessionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImpersonationSessionRepository for PostgresImpersonationSessionRepository {
    async fn insert_session(
        &self,
        session: NewImpersonationSession,
    ) -> AppResult<ImpersonationSession> {
        let query = format!(
            r#"
            INSERT INTO support_access_sessions (
                id,
                token_id,
                tenant_id,
                operator_name,
                operator_email,
                operator_identifier,
                session_token_hash,
                ip_address,
                user_agent,
                started_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session.id)
            .bind(session.token_id)
            .bind(session.tenant_id.as_uuid())
            .bind(session.operator_name.as_str())
            .bind(session.operator_email.as_deref())
            .bind(session.operator_identifier.as_str())
            .bind(session.session_token_hash.as_str())
            .bind(session.request.ip_address.as_deref())
            .bind(session.request.user_agent.as_deref())
            .bind(session.started_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to create support session for token '{}': {error}",
                    session.token_id
                ))
            })?;

        ImpersonationSession::try_from(row)
    }

    async fn find_active_session_by_hash(
        &self,
        session_token_hash: &str,
    ) -> AppResult<Option<ImpersonationSession>> {
        let query = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM support_access_sessions
            WHERE session_token_hash = $1 AND is_active
            "#
        );

        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to look up support session: {error}"))
            })?;

        row.map(ImpersonationSession::try_from).transpose()
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        session_id: Uuid,
    ) -> AppResult<Option<ImpersonationSession>> {
        let query = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM support_access_sessions
            WHERE tenant_id = $1 AND id = $2
            "#
        );

        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(tenant_id.as_uuid())
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to find support session '{session_id}' for tenant '{tenant_id}': {error}"
                ))
            })?;

        row.map(ImpersonationSession::try_from).transpose()
    }

    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> AppResult<Vec<SessionSummary>> {
        let rows = sqlx::query_as::<_, SessionSummaryRow>(
            r#"
            SELECT s.*, t.token_prefix, t.purpose AS token_purpose
            FROM support_access_sessions s
            JOIN support_access_tokens t ON t.id = s.token_id
            WHERE s.tenant_id = $1
              AND ($2 = FALSE OR s.is_active)
            ORDER BY s.started_at DESC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list support sessions for tenant '{tenant_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(SessionSummary {
                    session: ImpersonationSession::try_from(row.session)?,
                    token_prefix: row.token_prefix,
                    token_purpose: row.token_purpose,
                })
            })
            .collect()
    }

    async fn end_session(
        &self,
        session_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<ImpersonationSession>> {
        let query = format!(
            r#"
            UPDATE support_access_sessions
            SET is_active = FALSE,
                ended_at = COALESCE(ended_at, $2),
                end_reason = COALESCE(end_reason, $3)
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(session_id)
            .bind(ended_at)
            .bind(reason.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to end support session '{session_id}': {error}"
                ))
            })?;

        row.map(ImpersonationSession::try_from).transpose()
    }

    async fn end_sessions_for_token(
        &self,
        token_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE support_access_sessions
            SET is_active = FALSE,
                ended_at = $2,
                end_reason = $3
            WHERE token_id = $1 AND is_active
            "#,
        )
        .bind(token_id)
        .bind(ended_at)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to end sessions of support access token '{token_id}': {error}"
            ))
        })?;

        Ok(result.rows_affected())
    }

    async fn end_inactive_sessions(
        &self,
        idle_before: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE support_access_sessions
            SET is_active = FALSE,
                ended_at = $2,
                end_reason = $3
            WHERE is_active
              AND COALESCE(last_action_at, started_at) < $1
            "#,
        )
        .bind(idle_before)
        .bind(ended_at)
        .bind(SessionEndReason::Inactivity.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to end inactive support sessions: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    token_id: Uuid,
    tenant_id: Uuid,
    operator_name: String,
    operator_email: Option<String>,
    operator_identifier: String,
    session_token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    end_reason: Option<String>,
    is_active: bool,
    actions_count: i32,
    last_action_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct SessionSummaryRow {
    #[sqlx(flatten)]
    session: SessionRow,
    token_prefix: String,
    token_purpose: Option<String>,
}

impl TryFrom<SessionRow> for ImpersonationSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            token_id: row.token_id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            operator_name: row.operator_name,
            operator_email: row.operator_email,
            operator_identifier: row.operator_identifier,
            session_token_hash: row.session_token_hash,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            started_at: row.started_at,
            ended_at: row.ended_at,
            end_reason: row
                .end_reason
                .as_deref()
                .map(SessionEndReason::from_str)
                .transpose()?,
            is_active: row.is_active,
            actions_count: u32::try_from(row.actions_count).unwrap_or_default(),
            last_action_at: row.last_action_at,
        })
    }
}
