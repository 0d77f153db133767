use tracing::info;

use super::*;

impl PostgresAccessTokenRepository {
    pub(super) async fn record_usage_impl(
        &self,
        token_id: Uuid,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE support_access_tokens
            SET use_count = use_count + 1,
                last_used_at = $2
            WHERE id = $1
              AND (max_uses IS NULL OR use_count < max_uses)
            RETURNING id
            "#,
        )
        .bind(token_id)
        .bind(used_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record usage of support access token '{token_id}': {error}"
            ))
        })?;

        Ok(updated.is_some())
    }

    pub(super) async fn extend_token_impl(
        &self,
        extension: TokenExtension,
    ) -> AppResult<Option<AccessToken>> {
        let query = format!(
            r#"
            UPDATE support_access_tokens
            SET expires_at = $3,
                extension_count = extension_count + 1,
                last_extended_at = $4,
                last_extended_by = $5
            WHERE tenant_id = $1
              AND id = $2
              AND extension_count < max_extensions
              AND revoked_at IS NULL
            RETURNING {ACCESS_TOKEN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccessTokenRow>(&query)
            .bind(extension.tenant_id.as_uuid())
            .bind(extension.token_id)
            .bind(extension.expires_at)
            .bind(extension.extended_at)
            .bind(extension.extended_by.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to extend support access token '{}': {error}",
                    extension.token_id
                ))
            })?;

        row.map(AccessToken::try_from).transpose()
    }

    pub(super) async fn revoke_token_impl(
        &self,
        revocation: TokenRevocation,
    ) -> AppResult<Option<(AccessToken, u64)>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start revocation transaction for support access token '{}': {error}",
                revocation.token_id
            ))
        })?;

        let ended_sessions = sqlx::query(
            r#"
            UPDATE support_access_sessions
            SET is_active = FALSE,
                ended_at = $3,
                end_reason = $4
            WHERE tenant_id = $1
              AND token_id = $2
              AND is_active
            "#,
        )
        .bind(revocation.tenant_id.as_uuid())
        .bind(revocation.token_id)
        .bind(revocation.revoked_at)
        .bind(revocation.session_end_reason.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to end sessions of support access token '{}': {error}",
                revocation.token_id
            ))
        })?
        .rows_affected();

        let query = format!(
            r#"
            UPDATE support_access_tokens
            SET is_active = FALSE,
                revoked_at = $3,
                revoked_by = $4,
                revoke_reason = $5
            WHERE tenant_id = $1
              AND id = $2
              AND revoked_at IS NULL
            RETURNING {ACCESS_TOKEN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccessTokenRow>(&query)
            .bind(revocation.tenant_id.as_uuid())
            .bind(revocation.token_id)
            .bind(revocation.revoked_at)
            .bind(revocation.revoked_by.as_str())
            .bind(revocation.reason.as_deref())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to revoke support access token '{}': {error}",
                    revocation.token_id
                ))
            })?;

        let Some(row) = row else {
            transaction.rollback().await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to roll back revocation of support access token '{}': {error}",
                    revocation.token_id
                ))
            })?;

            // Missing, or revoked by a concurrent request; the first revocation stands.
            let existing = self
                .find_token_impl(revocation.tenant_id, revocation.token_id)
                .await?;
            return Ok(existing.map(|token| (token, 0)));
        };
        let token = AccessToken::try_from(row)?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit revocation of support access token '{}': {error}",
                revocation.token_id
            ))
        })?;

        info!(
            token_id = %token.id,
            token_prefix = %token.token_prefix,
            ended_sessions,
            "support access token revoked"
        );

        Ok(Some((token, ended_sessions)))
    }
}
