use super::*;

const ACCESS_TOKEN_USAGE_SELECT: &str = r#"
    SELECT
        t.*,
        (
            SELECT COUNT(*)
            FROM support_access_sessions s
            WHERE s.token_id = t.id
        ) AS total_sessions,
        (
            SELECT COUNT(*)
            FROM support_access_sessions s
            WHERE s.token_id = t.id AND s.is_active
        ) AS active_sessions,
        (
            SELECT COUNT(*)
            FROM support_access_audit_log a
            WHERE a.token_id = t.id
        ) AS total_actions
    FROM support_access_tokens t
"#;

impl PostgresAccessTokenRepository {
    pub(super) async fn find_token_by_hash_impl(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<AccessToken>> {
        let query = format!(
            r#"
            SELECT {ACCESS_TOKEN_COLUMNS}
            FROM support_access_tokens
            WHERE token_hash = $1
            "#
        );

        let row = sqlx::query_as::<_, AccessTokenRow>(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to look up support access token: {error}"))
            })?;

        row.map(AccessToken::try_from).transpose()
    }

    pub(super) async fn find_token_impl(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessToken>> {
        let query = format!(
            r#"
            SELECT {ACCESS_TOKEN_COLUMNS}
            FROM support_access_tokens
            WHERE tenant_id = $1 AND id = $2
            "#
        );

        let row = sqlx::query_as::<_, AccessTokenRow>(&query)
            .bind(tenant_id.as_uuid())
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to find support access token '{token_id}' for tenant '{tenant_id}': {error}"
                ))
            })?;

        row.map(AccessToken::try_from).transpose()
    }

    pub(super) async fn find_token_usage_impl(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessTokenUsage>> {
        let query = format!("{ACCESS_TOKEN_USAGE_SELECT} WHERE t.tenant_id = $1 AND t.id = $2");

        let row = sqlx::query_as::<_, AccessTokenUsageRow>(&query)
            .bind(tenant_id.as_uuid())
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to load support access token '{token_id}' usage for tenant '{tenant_id}': {error}"
                ))
            })?;

        row.map(AccessTokenUsage::try_from).transpose()
    }

    pub(super) async fn list_token_usage_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<AccessTokenUsage>> {
        let query =
            format!("{ACCESS_TOKEN_USAGE_SELECT} WHERE t.tenant_id = $1 ORDER BY t.created_at DESC");

        let rows = sqlx::query_as::<_, AccessTokenUsageRow>(&query)
            .bind(tenant_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list support access tokens for tenant '{tenant_id}': {error}"
                ))
            })?;

        rows.into_iter().map(AccessTokenUsage::try_from).collect()
    }
}
