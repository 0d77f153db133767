use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use warden_application::{
    AccessTokenRepository, AccessTokenUsage, AuditLogPage, AuditLogQuery, AuditLogRecord,
    ImpersonationSessionRepository, NewAccessToken, NewAuditEntry, NewImpersonationSession,
    SessionSummary, SupportAccessStats, SupportAuditRepository, TenantAccount,
    TenantAccountRepository, TokenExtension, TokenRevocation,
};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{
    AccessToken, ImpersonationSession, SessionEndReason, SupportAuditEntry, TokenStatus,
};

#[cfg(test)]
mod tests;

#[derive(Debug, Default)]
struct SupportAccessState {
    tenants: HashMap<TenantId, TenantAccount>,
    tokens: HashMap<Uuid, AccessToken>,
    sessions: HashMap<Uuid, ImpersonationSession>,
    entries: Vec<SupportAuditEntry>,
}

impl SupportAccessState {
    fn usage(&self, token: &AccessToken) -> AccessTokenUsage {
        let mut total_sessions = 0;
        let mut active_sessions = 0;
        for session in self.sessions.values().filter(|s| s.token_id == token.id) {
            total_sessions += 1;
            if session.is_active {
                active_sessions += 1;
            }
        }

        AccessTokenUsage {
            token: token.clone(),
            total_sessions,
            active_sessions,
            total_actions: self
                .entries
                .iter()
                .filter(|entry| entry.token_id == token.id)
                .count() as u64,
        }
    }

    fn tenant_token(&self, tenant_id: TenantId, token_id: Uuid) -> Option<&AccessToken> {
        self.tokens
            .get(&token_id)
            .filter(|token| token.tenant_id == tenant_id)
    }

    fn end_token_sessions(
        &mut self,
        token_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> u64 {
        self.sessions
            .values_mut()
            .filter(|session| session.token_id == token_id)
            .map(|session| session.end(ended_at, reason))
            .filter(|ended| *ended)
            .count() as u64
    }
}

/// In-memory support access store implementing every persistence port.
///
/// All state sits behind one lock, so multi-row updates such as revocation
/// are atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct InMemorySupportAccessStore {
    state: RwLock<SupportAccessState>,
}

impl InMemorySupportAccessStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a tenant account.
    pub async fn upsert_tenant(&self, account: TenantAccount) {
        self.state
            .write()
            .await
            .tenants
            .insert(account.tenant_id, account);
    }
}

#[async_trait]
impl AccessTokenRepository for InMemorySupportAccessStore {
    async fn insert_token(&self, token: NewAccessToken) -> AppResult<AccessToken> {
        let mut state = self.state.write().await;

        if state.tokens.contains_key(&token.id)
            || state
                .tokens
                .values()
                .any(|stored| stored.token_hash == token.token_hash)
        {
            return Err(AppError::Conflict(format!(
                "support access token '{}' already exists",
                token.id
            )));
        }

        let stored = AccessToken {
            id: token.id,
            tenant_id: token.tenant_id,
            created_by: token.created_by,
            token_hash: token.token_hash,
            token_prefix: token.token_prefix,
            scope: token.scope,
            expires_at: token.expires_at,
            original_expires_at: token.expires_at,
            is_active: true,
            revoked_at: None,
            revoked_by: None,
            revoke_reason: None,
            use_count: 0,
            max_uses: token.options.max_uses,
            last_used_at: None,
            extension_count: 0,
            max_extensions: token.max_extensions,
            last_extended_at: None,
            last_extended_by: None,
            operator_email: token.options.operator_email,
            operator_name: token.options.operator_name,
            purpose: token.options.purpose,
            notes: token.options.notes,
            created_at: token.created_at,
        };
        state.tokens.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_token_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessToken>> {
        Ok(self
            .state
            .read()
            .await
            .tokens
            .values()
            .find(|token| token.token_hash == token_hash)
            .cloned())
    }

    async fn find_token(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessToken>> {
        Ok(self
            .state
            .read()
            .await
            .tenant_token(tenant_id, token_id)
            .cloned())
    }

    async fn find_token_usage(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessTokenUsage>> {
        let state = self.state.read().await;
        Ok(state
            .tenant_token(tenant_id, token_id)
            .map(|token| state.usage(token)))
    }

    async fn list_token_usage(&self, tenant_id: TenantId) -> AppResult<Vec<AccessTokenUsage>> {
        let state = self.state.read().await;

        let mut values: Vec<AccessTokenUsage> = state
            .tokens
            .values()
            .filter(|token| token.tenant_id == tenant_id)
            .map(|token| state.usage(token))
            .collect();
        values.sort_by(|left, right| right.token.created_at.cmp(&left.token.created_at));

        Ok(values)
    }

    async fn record_usage(&self, token_id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(token) = state.tokens.get_mut(&token_id) else {
            return Ok(false);
        };

        if token.is_usage_exhausted() {
            return Ok(false);
        }

        token.use_count += 1;
        token.last_used_at = Some(used_at);
        Ok(true)
    }

    async fn extend_token(&self, extension: TokenExtension) -> AppResult<Option<AccessToken>> {
        let mut state = self.state.write().await;
        let Some(token) = state
            .tokens
            .get_mut(&extension.token_id)
            .filter(|token| token.tenant_id == extension.tenant_id)
        else {
            return Ok(None);
        };

        if token.extension_count >= token.max_extensions || token.revoked_at.is_some() {
            return Ok(None);
        }

        token.expires_at = extension.expires_at;
        token.extension_count += 1;
        token.last_extended_at = Some(extension.extended_at);
        token.last_extended_by = Some(extension.extended_by);
        Ok(Some(token.clone()))
    }

    async fn revoke_token(
        &self,
        revocation: TokenRevocation,
    ) -> AppResult<Option<(AccessToken, u64)>> {
        let mut state = self.state.write().await;
        match state.tenant_token(revocation.tenant_id, revocation.token_id) {
            None => return Ok(None),
            Some(token) if token.revoked_at.is_some() => return Ok(Some((token.clone(), 0))),
            Some(_) => {}
        }

        let ended_sessions = state.end_token_sessions(
            revocation.token_id,
            revocation.session_end_reason,
            revocation.revoked_at,
        );

        let Some(token) = state.tokens.get_mut(&revocation.token_id) else {
            return Ok(None);
        };
        token.is_active = false;
        token.revoked_at = Some(revocation.revoked_at);
        token.revoked_by = Some(revocation.revoked_by);
        token.revoke_reason = revocation.reason;

        Ok(Some((token.clone(), ended_sessions)))
    }
}

#[async_trait]
impl ImpersonationSessionRepository for InMemorySupportAccessStore {
    async fn insert_session(
        &self,
        session: NewImpersonationSession,
    ) -> AppResult<ImpersonationSession> {
        let mut state = self.state.write().await;

        if !state.tokens.contains_key(&session.token_id) {
            return Err(AppError::NotFound(format!(
                "support access token '{}' does not exist",
                session.token_id
            )));
        }

        let stored = ImpersonationSession {
            id: session.id,
            token_id: session.token_id,
            tenant_id: session.tenant_id,
            operator_name: session.operator_name,
            operator_email: session.operator_email,
            operator_identifier: session.operator_identifier,
            session_token_hash: session.session_token_hash,
            ip_address: session.request.ip_address,
            user_agent: session.request.user_agent,
            started_at: session.started_at,
            ended_at: None,
            end_reason: None,
            is_active: true,
            actions_count: 0,
            last_action_at: None,
        };
        state.sessions.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn find_active_session_by_hash(
        &self,
        session_token_hash: &str,
    ) -> AppResult<Option<ImpersonationSession>> {
        Ok(self
            .state
            .read()
            .await
            .sessions
            .values()
            .find(|session| session.is_active && session.session_token_hash == session_token_hash)
            .cloned())
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        session_id: Uuid,
    ) -> AppResult<Option<ImpersonationSession>> {
        Ok(self
            .state
            .read()
            .await
            .sessions
            .get(&session_id)
            .filter(|session| session.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> AppResult<Vec<SessionSummary>> {
        let state = self.state.read().await;

        let mut values: Vec<SessionSummary> = state
            .sessions
            .values()
            .filter(|session| session.tenant_id == tenant_id)
            .filter(|session| !active_only || session.is_active)
            .filter_map(|session| {
                let token = state.tokens.get(&session.token_id)?;
                Some(SessionSummary {
                    session: session.clone(),
                    token_prefix: token.token_prefix.clone(),
                    token_purpose: token.purpose.clone(),
                })
            })
            .collect();
        values.sort_by(|left, right| right.session.started_at.cmp(&left.session.started_at));

        Ok(values)
    }

    async fn end_session(
        &self,
        session_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<ImpersonationSession>> {
        let mut state = self.state.write().await;
        Ok(state.sessions.get_mut(&session_id).map(|session| {
            session.end(ended_at, reason);
            session.clone()
        }))
    }

    async fn end_sessions_for_token(
        &self,
        token_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        Ok(self
            .state
            .write()
            .await
            .end_token_sessions(token_id, reason, ended_at))
    }

    async fn end_inactive_sessions(
        &self,
        idle_before: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        Ok(self
            .state
            .write()
            .await
            .sessions
            .values_mut()
            .filter(|session| session.is_active && session.last_activity_at() < idle_before)
            .map(|session| session.end(ended_at, SessionEndReason::Inactivity))
            .filter(|ended| *ended)
            .count() as u64)
    }
}

#[async_trait]
impl SupportAuditRepository for InMemorySupportAccessStore {
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<SupportAuditEntry> {
        let mut state = self.state.write().await;

        let Some(session) = state.sessions.get_mut(&entry.session_id) else {
            return Err(AppError::NotFound(format!(
                "support session '{}' does not exist",
                entry.session_id
            )));
        };
        if session
            .last_action_at
            .is_none_or(|last_action_at| last_action_at <= entry.created_at)
        {
            session.record_action(entry.created_at);
        } else {
            session.actions_count = session.actions_count.saturating_add(1);
        }

        let stored = SupportAuditEntry {
            id: entry.id,
            session_id: entry.session_id,
            token_id: entry.token_id,
            tenant_id: entry.tenant_id,
            action_type: entry.action_type,
            resource_type: entry.resource.resource_type,
            resource_id: entry.resource.resource_id,
            resource_name: entry.resource.resource_name,
            action_details: entry.action_details,
            endpoint: entry.endpoint,
            http_method: entry.http_method,
            request_body_summary: entry.request_body_summary,
            response_status: entry.response_status,
            ip_address: entry.request.ip_address,
            user_agent: entry.request.user_agent,
            created_at: entry.created_at,
        };
        state.entries.push(stored.clone());

        Ok(stored)
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: &AuditLogQuery,
    ) -> AppResult<AuditLogPage> {
        let state = self.state.read().await;

        let mut matching: Vec<&SupportAuditEntry> = state
            .entries
            .iter()
            .filter(|entry| entry.tenant_id == tenant_id)
            .filter(|entry| query.session_id.is_none_or(|id| entry.session_id == id))
            .filter(|entry| query.token_id.is_none_or(|id| entry.token_id == id))
            .filter(|entry| query.action_type.is_none_or(|kind| entry.action_type == kind))
            .filter(|entry| {
                query
                    .resource_type
                    .is_none_or(|kind| entry.resource_type == kind)
            })
            .filter(|entry| query.start_date.is_none_or(|start| entry.created_at >= start))
            .filter(|entry| query.end_date.is_none_or(|end| entry.created_at <= end))
            .collect();
        matching.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });

        let total = matching.len() as u64;
        let entries = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .filter_map(|entry| {
                let session = state.sessions.get(&entry.session_id)?;
                let token = state.tokens.get(&entry.token_id)?;
                Some(AuditLogRecord {
                    entry: entry.clone(),
                    operator_name: session.operator_name.clone(),
                    operator_email: session.operator_email.clone(),
                    token_prefix: token.token_prefix.clone(),
                    token_purpose: token.purpose.clone(),
                })
            })
            .collect();

        Ok(AuditLogPage {
            entries,
            total,
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
        let state = self.state.read().await;
        let tenant_sessions = || {
            state
                .sessions
                .values()
                .filter(move |session| session.tenant_id == tenant_id)
        };

        Ok(SupportAccessStats {
            active_tokens: state
                .tokens
                .values()
                .filter(|token| token.tenant_id == tenant_id)
                .filter(|token| token.status_at(now) == TokenStatus::Active)
                .count() as u64,
            active_sessions: tenant_sessions()
                .filter(|session| session.is_active)
                .count() as u64,
            actions_last_30_days: state
                .entries
                .iter()
                .filter(|entry| entry.tenant_id == tenant_id && entry.created_at >= since)
                .count() as u64,
            sessions_last_30_days: tenant_sessions()
                .filter(|session| session.started_at >= since)
                .count() as u64,
        })
    }
}

#[async_trait]
impl TenantAccountRepository for InMemorySupportAccessStore {
    async fn find_account(&self, tenant_id: TenantId) -> AppResult<Option<TenantAccount>> {
        Ok(self.state.read().await.tenants.get(&tenant_id).cloned())
    }
}
