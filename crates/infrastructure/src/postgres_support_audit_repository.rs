//! PostgreSQL-backed support audit log repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{
    AuditLogPage, AuditLogQuery, AuditLogRecord, NewAuditEntry, SupportAccessStats,
    SupportAuditRepository,
};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{ResourceType, SupportActionType, SupportAuditEntry};


/// PostgreSQL implementation of the support audit repository port.
#[derive(Clone)]
pub struct PostgresSupportAuditRepository {
    pool: PgPool,
}

impl PostgresSupportAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupportAuditRepository for PostgresSupportAuditRepository {
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<SupportAuditEntry> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start audit transaction for support session '{}': {error}",
                entry.session_id
            ))
        })?;

        let row = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            INSERT INTO support_access_audit_log (
                id,
                session_id,
                token_id,
                tenant_id,
                action_type,
                resource_type,
                resource_id,
                resource_name,
                action_details,
                endpoint,
                http_method,
                request_body_summary,
                response_status,
                ip_address,
                user_agent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(entry.session_id)
        .bind(entry.token_id)
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.action_type.as_str())
        .bind(entry.resource.resource_type.as_str())
        .bind(entry.resource.resource_id.as_deref())
        .bind(entry.resource.resource_name.as_deref())
        .bind(entry.action_details.as_ref())
        .bind(entry.endpoint.as_deref())
        .bind(entry.http_method.as_deref())
        .bind(entry.request_body_summary.as_ref())
        .bind(entry.response_status.map(i32::from))
        .bind(entry.request.ip_address.as_deref())
        .bind(entry.request.user_agent.as_deref())
        .bind(entry.created_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append support audit entry for session '{}': {error}",
                entry.session_id
            ))
        })?;

        sqlx::query(
            r#"
            UPDATE support_access_sessions
            SET actions_count = actions_count + 1,
                last_action_at = GREATEST(COALESCE(last_action_at, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(entry.session_id)
        .bind(entry.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update activity of support session '{}': {error}",
                entry.session_id
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit audit entry for support session '{}': {error}",
                entry.session_id
            ))
        })?;

        SupportAuditEntry::try_from(row)
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: &AuditLogQuery,
    ) -> AppResult<AuditLogPage> {
        let action_type = query.action_type.map(|value| value.as_str());
        let resource_type = query.resource_type.map(|value| value.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM support_access_audit_log a
            WHERE a.tenant_id = $1
              AND ($2::uuid IS NULL OR a.session_id = $2)
              AND ($3::uuid IS NULL OR a.token_id = $3)
              AND ($4::text IS NULL OR a.action_type = $4)
              AND ($5::text IS NULL OR a.resource_type = $5)
              AND ($6::timestamptz IS NULL OR a.created_at >= $6)
              AND ($7::timestamptz IS NULL OR a.created_at <= $7)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.session_id)
        .bind(query.token_id)
        .bind(action_type)
        .bind(resource_type)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to count support audit entries for tenant '{tenant_id}': {error}"
            ))
        })?;

        let rows = sqlx::query_as::<_, AuditLogRecordRow>(
            r#"
            SELECT
                a.*,
                s.operator_name,
                s.operator_email,
                t.token_prefix,
                t.purpose AS token_purpose
            FROM support_access_audit_log a
            JOIN support_access_sessions s ON s.id = a.session_id
            JOIN support_access_tokens t ON t.id = a.token_id
            WHERE a.tenant_id = $1
              AND ($2::uuid IS NULL OR a.session_id = $2)
              AND ($3::uuid IS NULL OR a.token_id = $3)
              AND ($4::text IS NULL OR a.action_type = $4)
              AND ($5::text IS NULL OR a.resource_type = $5)
              AND ($6::timestamptz IS NULL OR a.created_at >= $6)
              AND ($7::timestamptz IS NULL OR a.created_at <= $7)
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.session_id)
        .bind(query.token_id)
        .bind(action_type)
        .bind(resource_type)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(i64::from(query.limit))
        .bind(i64::from(query.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list support audit entries for tenant '{tenant_id}': {error}"
            ))
        })?;

        let entries = rows
            .into_iter()
            .map(|row| {
                Ok(AuditLogRecord {
                    entry: SupportAuditEntry::try_from(row.entry)?,
                    operator_name: row.operator_name,
                    operator_email: row.operator_email,
                    token_prefix: row.token_prefix,
                    token_purpose: row.token_purpose,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(AuditLogPage {
            entries,
            total: u64::try_from(total).unwrap_or_default(),
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn access_stats(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
        since: DateTime<Utc>,
    ) -> AppResult<SupportAccessStats> {
        let row = sqlx::query_as::<_, AccessStatsRow>(
            r#"
            SELECT
                (
                    SELECT COUNT(*)
                    FROM support_access_tokens
                    WHERE tenant_id = $1
                      AND is_active
                      AND revoked_at IS NULL
                      AND expires_at > $2
                ) AS active_tokens,
                (
                    SELECT COUNT(*)
                    FROM support_access_sessions
                    WHERE tenant_id = $1 AND is_active
                ) AS active_sessions,
                (
                    SELECT COUNT(*)
                    FROM support_access_audit_log
                    WHERE tenant_id = $1 AND created_at >= $3
                ) AS actions_last_30_days,
                (
                    SELECT COUNT(*)
                    FROM support_access_sessions
                    WHERE tenant_id = $1 AND started_at >= $3
                ) AS sessions_last_30_days
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(now)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load support access stats for tenant '{tenant_id}': {error}"
            ))
        })?;

        Ok(SupportAccessStats {
            active_tokens: u64::try_from(row.active_tokens).unwrap_or_default(),
            active_sessions: u64::try_from(row.active_sessions).unwrap_or_default(),
            actions_last_30_days: u64::try_from(row.actions_last_30_days).unwrap_or_default(),
            sessions_last_30_days: u64::try_from(row.sessions_last_30_days).unwrap_or_default(),
        })
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    id: Uuid,
    session_id: Uuid,
    token_id: Uuid,
    tenant_id: Uuid,
    action_type: String,
    resource_type: String,
    resource_id: Option<String>,
    resource_name: Option<String>,
    action_details: Option<Value>,
    endpoint: Option<String>,
    http_method: Option<String>,
    request_body_summary: Option<Value>,
    response_status: Option<i32>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AuditLogRecordRow {
    #[sqlx(flatten)]
    entry: AuditEntryRow,
    operator_name: String,
    operator_email: Option<String>,
    token_prefix: String,
    token_purpose: Option<String>,
}

#[derive(Debug, FromRow)]
struct AccessStatsRow {
    active_tokens: i64,
    active_sessions: i64,
    actions_last_30_days: i64,
    sessions_last_30_days: i64,
}

impl TryFrom<AuditEntryRow> for SupportAuditEntry {
    type Error = AppError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            token_id: row.token_id,
            tenant_id: TenantId::from_uuid(row.tenant_id),
            action_type: SupportActionType::from_str(row.action_type.as_str())?,
            resource_type: ResourceType::from_str(row.resource_type.as_str())?,
            resource_id: row.resource_id,
            resource_name: row.resource_name,
            action_details: row.action_details,
            endpoint: row.endpoint,
            http_method: row.http_method,
            request_body_summary: row.request_body_summary,
            response_status: row
                .response_status
                .and_then(|status| u16::try_from(status).ok()),
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}
