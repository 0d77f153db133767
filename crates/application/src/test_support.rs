//! Port fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;
use warden_core::{AppError, AppResult, TenantId, TenantRole, UserIdentity};
use warden_domain::{
    AccessToken, AccessTokenPolicy, ForbiddenActionGuard, ImpersonationSession, RequestMethod,
    SessionEndReason, SupportAuditEntry, TokenStatus,
};

use crate::{
    AccessTokenRepository, AccessTokenService, AccessTokenUsage, AuditLogPage, AuditLogQuery,
    AuditLogRecord, Clock, CreateAccessTokenInput, ImpersonatedRequest, ImpersonationContext,
    ImpersonationSessionRepository, ImpersonationSessionService, IssuedAccessToken,
    NewAccessToken, NewAuditEntry, NewImpersonationSession, OperatorAccessService,
    OperatorAuthenticationInput, RequestContext, SessionClaims, SessionCredentialSigner,
    SessionSummary, StartedSession, SupportAccessAdminService, SupportAccessGateway,
    SupportAccessStats, SupportAuditRepository, SupportAuditService, TenantAccount,
    TenantAccountRepository, TokenExtension, TokenRevocation, UpstreamForwarder, UpstreamRequest,
    UpstreamResponse,
};

pub(crate) struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub(crate) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Signs claims into a readable pipe-separated string.
pub(crate) struct FakeSigner;

impl SessionCredentialSigner for FakeSigner {
    fn sign(&self, claims: &SessionClaims) -> AppResult<String> {
        Ok(format!(
            "signed|{}|{}|{}|{}|{}|{}|{}",
            claims.session_id,
            claims.token_id,
            claims.tenant_id,
            claims.issued_at.timestamp_millis(),
            claims.expires_at.timestamp_millis(),
            claims.operator_identifier,
            claims.operator_name
        ))
    }

    fn verify(&self, credential: &str, now: DateTime<Utc>) -> Option<SessionClaims> {
        let mut parts = credential.strip_prefix("signed|")?.splitn(7, '|');
        let session_id = Uuid::parse_str(parts.next()?).ok()?;
        let token_id = Uuid::parse_str(parts.next()?).ok()?;
        let tenant_id = TenantId::from_uuid(Uuid::parse_str(parts.next()?).ok()?);
        let issued_at = DateTime::from_timestamp_millis(parts.next()?.parse().ok()?)?;
        let expires_at = DateTime::from_timestamp_millis(parts.next()?.parse().ok()?)?;
        let operator_identifier = parts.next()?.to_owned();
        let operator_name = parts.next()?.to_owned();

        if expires_at <= now {
            return None;
        }

        Some(SessionClaims {
            session_id,
            token_id,
            tenant_id,
            operator_name,
            operator_identifier,
            issued_at,
            expires_at,
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeForwarder {
    requests: Mutex<Vec<UpstreamRequest>>,
    failing: AtomicBool,
}

impl FakeForwarder {
    pub(crate) async fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().await.clone()
    }

    pub(crate) fn fail_next_calls(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UpstreamForwarder for FakeForwarder {
    async fn forward(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse> {
        self.requests.lock().await.push(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("upstream unavailable".to_owned()));
        }

        Ok(UpstreamResponse {
            status: 200,
            body: Some(json!({ "data": { "id": "agent-7", "name": "Greeter" } })),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeSupportAccessStore {
    tokens: Mutex<Vec<AccessToken>>,
    sessions: Mutex<Vec<ImpersonationSession>>,
    entries: Mutex<Vec<SupportAuditEntry>>,
    tenants: Mutex<HashMap<TenantId, TenantAccount>>,
}

impl FakeSupportAccessStore {
    pub(crate) async fn put_tenant(&self, tenant_id: TenantId, is_active: bool) {
        self.tenants.lock().await.insert(
            tenant_id,
            TenantAccount {
                tenant_id,
                name: "Acme".to_owned(),
                slug: "acme".to_owned(),
                is_active,
            },
        );
    }

    pub(crate) async fn token(&self, token_id: Uuid) -> Option<AccessToken> {
        self.tokens
            .lock()
            .await
            .iter()
            .find(|token| token.id == token_id)
            .cloned()
    }

    pub(crate) async fn session(&self, session_id: Uuid) -> Option<ImpersonationSession> {
        self.sessions
            .lock()
            .await
            .iter()
            .find(|session| session.id == session_id)
            .cloned()
    }

    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub(crate) async fn entries(&self) -> Vec<SupportAuditEntry> {
        self.entries.lock().await.clone()
    }
}

fn usage_for(
    token: &AccessToken,
    sessions: &[ImpersonationSession],
    entries: &[SupportAuditEntry],
) -> AccessTokenUsage {
    let token_sessions = sessions
        .iter()
        .filter(|session| session.token_id == token.id);

    AccessTokenUsage {
        token: token.clone(),
        total_sessions: token_sessions.clone().count() as u64,
        active_sessions: token_sessions.filter(|session| session.is_active).count() as u64,
        total_actions: entries
            .iter()
            .filter(|entry| entry.token_id == token.id)
            .count() as u64,
    }
}

#[async_trait]
impl AccessTokenRepository for FakeSupportAccessStore {
    async fn insert_token(&self, token: NewAccessToken) -> AppResult<AccessToken> {
        let token = AccessToken {
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
        self.tokens.lock().await.push(token.clone());
        Ok(token)
    }

    async fn find_token_by_hash(&self, token_hash: &str) -> AppResult<Option<AccessToken>> {
        Ok(self
            .tokens
            .lock()
            .await
            .iter()
            .find(|token| token.token_hash == token_hash)
            .cloned())
    }

    async fn find_token(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessToken>> {
        Ok(self
            .tokens
            .lock()
            .await
            .iter()
            .find(|token| token.id == token_id && token.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_token_usage(
        &self,
        tenant_id: TenantId,
        token_id: Uuid,
    ) -> AppResult<Option<AccessTokenUsage>> {
        let tokens = self.tokens.lock().await;
        let sessions = self.sessions.lock().await;
        let entries = self.entries.lock().await;

        Ok(tokens
            .iter()
            .find(|token| token.id == token_id && token.tenant_id == tenant_id)
            .map(|token| usage_for(token, &sessions, &entries)))
    }

    async fn list_token_usage(&self, tenant_id: TenantId) -> AppResult<Vec<AccessTokenUsage>> {
        let tokens = self.tokens.lock().await;
        let sessions = self.sessions.lock().await;
        let entries = self.entries.lock().await;

        let mut usage: Vec<AccessTokenUsage> = tokens
            .iter()
            .filter(|token| token.tenant_id == tenant_id)
            .map(|token| usage_for(token, &sessions, &entries))
            .collect();
        usage.sort_by(|left, right| right.token.created_at.cmp(&left.token.created_at));
        Ok(usage)
    }

    async fn record_usage(&self, token_id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool> {
        let mut tokens = self.tokens.lock().await;
        let Some(token) = tokens.iter_mut().find(|token| token.id == token_id) else {
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
        let mut tokens = self.tokens.lock().await;
        let Some(token) = tokens.iter_mut().find(|token| {
            token.id == extension.token_id && token.tenant_id == extension.tenant_id
        }) else {
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
        let mut tokens = self.tokens.lock().await;
        let mut sessions = self.sessions.lock().await;

        let Some(token) = tokens.iter_mut().find(|token| {
            token.id == revocation.token_id && token.tenant_id == revocation.tenant_id
        }) else {
            return Ok(None);
        };
        if token.revoked_at.is_some() {
            return Ok(Some((token.clone(), 0)));
        }

        let ended = sessions
            .iter_mut()
            .filter(|session| session.token_id == token.id)
            .map(|session| session.end(revocation.revoked_at, revocation.session_end_reason))
            .filter(|ended| *ended)
            .count() as u64;

        token.is_active = false;
        token.revoked_at = Some(revocation.revoked_at);
        token.revoked_by = Some(revocation.revoked_by);
        token.revoke_reason = revocation.reason;
        Ok(Some((token.clone(), ended)))
    }
}

#[async_trait]
impl ImpersonationSessionRepository for FakeSupportAccessStore {
    async fn insert_session(
        &self,
        session: NewImpersonationSession,
    ) -> AppResult<ImpersonationSession> {
        let session = ImpersonationSession {
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
        self.sessions.lock().await.push(session.clone());
        Ok(session)
    }

    async fn find_active_session_by_hash(
        &self,
        session_token_hash: &str,
    ) -> AppResult<Option<ImpersonationSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|session| session.is_active && session.session_token_hash == session_token_hash)
            .cloned())
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        session_id: Uuid,
    ) -> AppResult<Option<ImpersonationSession>> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .find(|session| session.id == session_id && session.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        active_only: bool,
    ) -> AppResult<Vec<SessionSummary>> {
        let tokens = self.tokens.lock().await;
        let sessions = self.sessions.lock().await;

        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .filter(|session| session.tenant_id == tenant_id)
            .filter(|session| !active_only || session.is_active)
            .filter_map(|session| {
                let token = tokens.iter().find(|token| token.id == session.token_id)?;
                Some(SessionSummary {
                    session: session.clone(),
                    token_prefix: token.token_prefix.clone(),
                    token_purpose: token.purpose.clone(),
                })
            })
            .collect();
        summaries.sort_by(|left, right| right.session.started_at.cmp(&left.session.started_at));
        Ok(summaries)
    }

    async fn end_session(
        &self,
        session_id: Uuid,
        reason: SessionEndReason,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Option<ImpersonationSession>> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .iter_mut()
            .find(|session| session.id == session_id)
            .map(|session| {
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
        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .iter_mut()
            .filter(|session| session.token_id == token_id)
            .map(|session| session.end(ended_at, reason))
            .filter(|ended| *ended)
            .count() as u64)
    }

    async fn end_inactive_sessions(
        &self,
        idle_before: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .iter_mut()
            .filter(|session| session.is_active && session.last_activity_at() < idle_before)
            .map(|session| session.end(ended_at, SessionEndReason::Inactivity))
            .filter(|ended| *ended)
            .count() as u64)
    }
}

#[async_trait]
impl SupportAuditRepository for FakeSupportAccessStore {
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<SupportAuditEntry> {
        let entry = SupportAuditEntry {
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

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions
            .iter_mut()
            .find(|session| session.id == entry.session_id)
        {
            session.record_action(entry.created_at);
        }
        drop(sessions);

        self.entries.lock().await.push(entry.clone());
        Ok(entry)
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: &AuditLogQuery,
    ) -> AppResult<AuditLogPage> {
        let tokens = self.tokens.lock().await;
        let sessions = self.sessions.lock().await;
        let entries = self.entries.lock().await;

        let mut matching: Vec<&SupportAuditEntry> = entries
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
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let total = matching.len() as u64;
        let entries = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .filter_map(|entry| {
                let session = sessions.iter().find(|session| session.id == entry.session_id)?;
                let token = tokens.iter().find(|token| token.id == entry.token_id)?;
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
        let tokens = self.tokens.lock().await;
        let sessions = self.sessions.lock().await;
        let entries = self.entries.lock().await;

        Ok(SupportAccessStats {
            active_tokens: tokens
                .iter()
                .filter(|token| token.tenant_id == tenant_id)
                .filter(|token| token.status_at(now) == TokenStatus::Active)
                .count() as u64,
            active_sessions: sessions
                .iter()
                .filter(|session| session.tenant_id == tenant_id && session.is_active)
                .count() as u64,
            actions_last_30_days: entries
                .iter()
                .filter(|entry| entry.tenant_id == tenant_id && entry.created_at >= since)
                .count() as u64,
            sessions_last_30_days: sessions
                .iter()
                .filter(|session| session.tenant_id == tenant_id && session.started_at >= since)
                .count() as u64,
        })
    }
}

#[async_trait]
impl TenantAccountRepository for FakeSupportAccessStore {
    async fn find_account(&self, tenant_id: TenantId) -> AppResult<Option<TenantAccount>> {
        Ok(self.tenants.lock().await.get(&tenant_id).cloned())
    }
}

/// Fully wired services over one fake store.
pub(crate) struct Harness {
    pub(crate) store: Arc<FakeSupportAccessStore>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) forwarder: Arc<FakeForwarder>,
    pub(crate) sessions: ImpersonationSessionService,
    pub(crate) audit: SupportAuditService,
    pub(crate) admin: SupportAccessAdminService,
    pub(crate) operator: OperatorAccessService,
    pub(crate) gateway: SupportAccessGateway,
    pub(crate) tenant_id: TenantId,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let store = Arc::new(FakeSupportAccessStore::default());
        let clock = Arc::new(ManualClock::starting_at(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
                .single()
                .unwrap_or_default(),
        ));
        let forwarder = Arc::new(FakeForwarder::default());
        let tenant_id = TenantId::new();
        store.put_tenant(tenant_id, true).await;

        let tokens = AccessTokenService::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            AccessTokenPolicy::default(),
        );
        let sessions = ImpersonationSessionService::new(
            tokens.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FakeSigner),
            clock.clone(),
            Duration::hours(8),
        );
        let audit = SupportAuditService::new(store.clone(), clock.clone());
        let admin = SupportAccessAdminService::new(tokens.clone(), sessions.clone(), audit.clone());
        let operator = OperatorAccessService::new(tokens, sessions.clone());
        let gateway = SupportAccessGateway::new(
            sessions.clone(),
            forwarder.clone(),
            ForbiddenActionGuard::new().unwrap_or_else(|_| unreachable!()),
            clock.clone(),
        );

        Self {
            store,
            clock,
            forwarder,
            sessions,
            audit,
            admin,
            operator,
            gateway,
            tenant_id,
        }
    }

    pub(crate) fn admin_identity(&self) -> UserIdentity {
        UserIdentity::new(
            "admin-1",
            "Ada Admin",
            Some("ada@acme.test".to_owned()),
            self.tenant_id,
            TenantRole::Admin,
        )
    }

    pub(crate) fn member_identity(&self) -> UserIdentity {
        UserIdentity::new("member-1", "Max Member", None, self.tenant_id, TenantRole::Member)
    }

    pub(crate) fn token_input(scope: &[&str]) -> CreateAccessTokenInput {
        CreateAccessTokenInput {
            scope: scope.iter().map(|scope| (*scope).to_owned()).collect(),
            ..CreateAccessTokenInput::default()
        }
    }

    pub(crate) async fn issue(&self, input: CreateAccessTokenInput) -> IssuedAccessToken {
        self.admin
            .create_token(&self.admin_identity(), input)
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    pub(crate) async fn authenticate(
        &self,
        raw_secret: &str,
        operator_email: Option<&str>,
    ) -> AppResult<StartedSession> {
        self.operator
            .authenticate(
                OperatorAuthenticationInput {
                    token: raw_secret.to_owned(),
                    operator_name: "Sam Support".to_owned(),
                    operator_email: operator_email.map(str::to_owned),
                },
                RequestContext {
                    ip_address: Some("203.0.113.9".to_owned()),
                    user_agent: Some("support-console/1.0".to_owned()),
                },
            )
            .await
    }

    pub(crate) fn request(
        method: RequestMethod,
        path: &str,
        body: Option<Value>,
    ) -> ImpersonatedRequest {
        ImpersonatedRequest {
            method,
            path: path.to_owned(),
            query: None,
            query_params: Map::new(),
            body,
            request: RequestContext::default(),
        }
    }

    pub(crate) async fn context(&self, started: &StartedSession) -> ImpersonationContext {
        self.gateway
            .authenticate(Some(&started.raw_credential))
            .await
            .unwrap_or_else(|_| unreachable!())
    }
}
