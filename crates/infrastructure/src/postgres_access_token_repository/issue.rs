use super::*;

impl PostgresAccessTokenRepository {
    pub(super) async fn insert_token_impl(&self, token: NewAccessToken) -> AppResult<AccessToken> {
        let max_uses = token
            .options
            .max_uses
            .map(|value| to_stored_count(value, "max_uses"))
            .transpose()?;
        let max_extensions = to_stored_count(token.max_extensions, "max_extensions")?;

        let query = format!(
            r#"
            INSERT INTO support_access_tokens (
                id,
                tenant_id,
                created_by,
                token_hash,
                token_prefix,
                scope,
                expires_at,
                original_expires_at,
                max_uses,
                max_extensions,
                operator_email,
                operator_name,
                purpose,
                notes,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ACCESS_TOKEN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccessTokenRow>(&query)
            .bind(token.id)
            .bind(token.tenant_id.as_uuid())
            .bind(token.created_by.as_str())
            .bind(token.token_hash.as_str())
            .bind(token.token_prefix.as_str())
            .bind(token.scope.to_strings())
            .bind(token.expires_at)
            .bind(max_uses)
            .bind(max_extensions)
            .bind(token.options.operator_email.as_deref())
            .bind(token.options.operator_name.as_deref())
            .bind(token.options.purpose.as_deref())
            .bind(token.options.notes.as_deref())
            .bind(token.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to create support access token for tenant '{}': {error}",
                    token.tenant_id
                ))
            })?;

        AccessToken::try_from(row)
    }
}
