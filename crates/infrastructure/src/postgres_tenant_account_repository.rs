use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{TenantAccount, TenantAccountRepository};
use warden_core::{AppError, AppResult, TenantId};

/// PostgreSQL-backed tenant account lookup.
#[derive(Clone)]
pub struct PostgresTenantAccountRepository {
    pool: PgPool,
}

impl PostgresTenantAccountRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantAccountRepository for PostgresTenantAccountRepository {
    async fn find_account(&self, tenant_id: TenantId) -> AppResult<Option<TenantAccount>> {
        let row = sqlx::query_as::<_, TenantAccountRow>(
            r#"
            SELECT id, name, slug, is_active
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load tenant '{tenant_id}': {error}"))
        })?;

        Ok(row.map(|row| TenantAccount {
            tenant_id: TenantId::from_uuid(row.id),
            name: row.name,
            slug: row.slug,
            is_active: row.is_active,
        }))
    }
}

#[derive(Debug, FromRow)]
struct TenantAccountRow {
    id: Uuid,
    name: String,
    slug: String,
    is_active: bool,
}
