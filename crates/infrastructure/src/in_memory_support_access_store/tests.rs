use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;
use warden_application::{
    AccessTokenOptions, AccessTokenRepository, AuditLogQuery, ImpersonationSessionRepository,
    NewAccessToken, NewAuditEntry, NewImpersonationSession, RequestContext,
    SupportAuditRepository, TenantAccount, TenantAccountRepository, TokenExtension,
    TokenRevocation,
};
use warden_core::{AppError, TenantId};
use warden_domain::{
    ResourceRef, ResourceType, ScopeSet, SessionEndReason, SupportActionType, SupportScope,
};

use super::InMemorySupportAccessStore;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

fn new_token(tenant_id: TenantId, hash: &str, max_uses: Option<u32>) -> NewAccessToken {
    NewAccessToken {
        id: Uuid::new_v4(),
        tenant_id,
        created_by: "admin-1".to_owned(),
        token_hash: hash.to_owned(),
        token_prefix: format!("sat_{}", &hash[..8]),
        scope: ScopeSet::new([SupportScope::Read]).unwrap_or_else(|_| unreachable!()),
        expires_at: base_time() + Duration::hours(168),
        max_extensions: 3,
        options: AccessTokenOptions {
            max_uses,
            purpose: Some("Onboarding help".to_owned()),
            ..AccessTokenOptions::default()
        },
        created_at: base_time(),
    }
}

fn new_session(
    token_id: Uuid,
    tenant_id: TenantId,
    started_at: DateTime<Utc>,
) -> NewImpersonationSession {
    let id = Uuid::new_v4();
    NewImpersonationSession {
        id,
        token_id,
        tenant_id,
        operator_name: "Sam Support".to_owned(),
        operator_email: Some("sam@support.example".to_owned()),
        operator_identifier: "0f1e2d3c4b5a6978".to_owned(),
        session_token_hash: format!("session-{id}"),
        request: RequestContext::default(),
        started_at,
    }
}

fn new_entry(
    session_id: Uuid,
    token_id: Uuid,
    tenant_id: TenantId,
    action_type: SupportActionType,
    created_at: DateTime<Utc>,
) -> NewAuditEntry {
    NewAuditEntry {
        id: Uuid::new_v4(),
        session_id,
        token_id,
        tenant_id,
        action_type,
        resource: ResourceRef {
            resource_type: ResourceType::AiAgents,
            resource_id: Some("agent-7".to_owned()),
            resource_name: None,
        },
        action_details: None,
        endpoint: Some("/api/agents/agent-7".to_owned()),
        http_method: Some("GET".to_owned()),
        request_body_summary: None,
        response_status: Some(200),
        request: RequestContext::default(),
        created_at,
    }
}

#[tokio::test]
async fn tokens_are_found_by_hash_and_scoped_to_their_tenant() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();

    let inserted = store
        .insert_token(new_token(tenant_id, "aaaaaaaaaaaa", None))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(inserted.original_expires_at, inserted.expires_at);
    assert!(inserted.is_active);

    let by_hash = store.find_token_by_hash("aaaaaaaaaaaa").await;
    assert_eq!(by_hash.ok().flatten().map(|token| token.id), Some(inserted.id));

    let other_tenant = store.find_token(TenantId::new(), inserted.id).await;
    assert!(matches!(other_tenant, Ok(None)));

    let duplicate = store
        .insert_token(new_token(tenant_id, "aaaaaaaaaaaa", None))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn record_usage_stops_at_the_redemption_cap() {
    let store = InMemorySupportAccessStore::new();
    let token = store
        .insert_token(new_token(TenantId::new(), "bbbbbbbbbbbb", Some(2)))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(store.record_usage(token.id, base_time()).await, Ok(true)));
    assert!(matches!(store.record_usage(token.id, base_time()).await, Ok(true)));
    assert!(matches!(store.record_usage(token.id, base_time()).await, Ok(false)));
    assert!(matches!(store.record_usage(Uuid::new_v4(), base_time()).await, Ok(false)));
}

#[tokio::test]
async fn extension_guard_rejects_revoked_tokens() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();
    let token = store
        .insert_token(new_token(tenant_id, "cccccccccccc", None))
        .await
        .unwrap_or_else(|_| unreachable!());

    let extension = TokenExtension {
        token_id: token.id,
        tenant_id,
        expires_at: token.expires_at + Duration::hours(24),
        extended_by: "admin-1".to_owned(),
        extended_at: base_time(),
    };
    let extended = store
        .extend_token(extension.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(extended.map(|token| token.extension_count), Some(1));

    let revoked = store
        .revoke_token(TokenRevocation {
            token_id: token.id,
            tenant_id,
            revoked_by: "admin-1".to_owned(),
            reason: None,
            revoked_at: base_time(),
            session_end_reason: SessionEndReason::TokenRevoked,
        })
        .await;
    assert!(matches!(revoked, Ok(Some(_))));

    assert!(matches!(store.extend_token(extension).await, Ok(None)));
}

#[tokio::test]
async fn revocation_ends_only_the_sessions_of_that_token() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();
    let revoked = store
        .insert_token(new_token(tenant_id, "dddddddddddd", None))
        .await
        .unwrap_or_else(|_| unreachable!());
    let kept = store
        .insert_token(new_token(tenant_id, "eeeeeeeeeeee", None))
        .await
        .unwrap_or_else(|_| unreachable!());

    for _ in 0..2 {
        let inserted = store
            .insert_session(new_session(revoked.id, tenant_id, base_time()))
            .await;
        assert!(inserted.is_ok());
    }
    let kept_session = store
        .insert_session(new_session(kept.id, tenant_id, base_time()))
        .await
        .unwrap_or_else(|_| unreachable!());

    let result = store
        .revoke_token(TokenRevocation {
            token_id: revoked.id,
            tenant_id,
            revoked_by: "admin-1".to_owned(),
            reason: Some("done".to_owned()),
            revoked_at: base_time() + Duration::minutes(5),
            session_end_reason: SessionEndReason::TokenRevoked,
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    let (token, ended) = result.unwrap_or_else(|| unreachable!());
    assert_eq!(ended, 2);
    assert!(!token.is_active);
    assert_eq!(token.revoke_reason.as_deref(), Some("done"));

    let active = store
        .list_sessions(tenant_id, true)
        .await
        .unwrap_or_default();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].session.id, kept_session.id);
}

#[tokio::test]
async fn second_revocation_keeps_the_first_record() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();
    let token = store
        .insert_token(new_token(tenant_id, "ffffffffffff", None))
        .await
        .unwrap_or_else(|_| unreachable!());

    let revocation = |revoked_by: &str, minutes: i64| TokenRevocation {
        token_id: token.id,
        tenant_id,
        revoked_by: revoked_by.to_owned(),
        reason: Some(format!("revoked by {revoked_by}")),
        revoked_at: base_time() + Duration::minutes(minutes),
        session_end_reason: SessionEndReason::TokenRevoked,
    };

    let first = store.revoke_token(revocation("admin-1", 5)).await;
    assert!(matches!(first, Ok(Some(_))));

    let second = store
        .revoke_token(revocation("admin-2", 10))
        .await
        .unwrap_or_else(|_| unreachable!());
    let (token, ended) = second.unwrap_or_else(|| unreachable!());
    assert_eq!(ended, 0);
    assert_eq!(token.revoked_by.as_deref(), Some("admin-1"));
    assert_eq!(token.revoked_at, Some(base_time() + Duration::minutes(5)));
    assert_eq!(token.revoke_reason.as_deref(), Some("revoked by admin-1"));
}

#[tokio::test]
async fn audit_entries_bump_session_counters_and_page_newest_first() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();
    let token = store
        .insert_token(new_token(tenant_id, "ffffffffffff", None))
        .await
        .unwrap_or_else(|_| unreachable!());
    let session = store
        .insert_session(new_session(token.id, tenant_id, base_time()))
        .await
        .unwrap_or_else(|_| unreachable!());

    for minutes in 1..=3 {
        let appended = store
            .append_entry(new_entry(
                session.id,
                token.id,
                tenant_id,
                SupportActionType::View,
                base_time() + Duration::minutes(minutes),
            ))
            .await;
        assert!(appended.is_ok());
    }

    let stored = store
        .find_session(tenant_id, session.id)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(stored.actions_count, 3);
    assert_eq!(stored.last_action_at, Some(base_time() + Duration::minutes(3)));

    let page = store
        .list_entries(
            tenant_id,
            &AuditLogQuery {
                limit: 2,
                ..AuditLogQuery::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(page.total, 3);
    assert!(page.has_more());
    assert_eq!(page.entries.len(), 2);
    assert_eq!(
        page.entries[0].entry.created_at,
        base_time() + Duration::minutes(3)
    );
    assert_eq!(page.entries[0].operator_name, "Sam Support");
    assert_eq!(page.entries[0].token_purpose.as_deref(), Some("Onboarding help"));

    let usage = store
        .find_token_usage(tenant_id, token.id)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(usage.total_sessions, 1);
    assert_eq!(usage.active_sessions, 1);
    assert_eq!(usage.total_actions, 3);
}

#[tokio::test]
async fn inactive_sweep_uses_last_activity() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();
    let token = store
        .insert_token(new_token(tenant_id, "999999999999", None))
        .await
        .unwrap_or_else(|_| unreachable!());
    let idle = store
        .insert_session(new_session(token.id, tenant_id, base_time()))
        .await
        .unwrap_or_else(|_| unreachable!());
    let busy = store
        .insert_session(new_session(token.id, tenant_id, base_time()))
        .await
        .unwrap_or_else(|_| unreachable!());
    let appended = store
        .append_entry(new_entry(
            busy.id,
            token.id,
            tenant_id,
            SupportActionType::Update,
            base_time() + Duration::minutes(100),
        ))
        .await;
    assert!(appended.is_ok());

    let now = base_time() + Duration::minutes(150);
    let ended = store
        .end_inactive_sessions(now - Duration::minutes(120), now)
        .await;
    assert!(matches!(ended, Ok(1)));

    let idle = store
        .find_session(tenant_id, idle.id)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(idle.end_reason, Some(SessionEndReason::Inactivity));

    let stats = store
        .access_stats(tenant_id, now, now - Duration::days(30))
        .await
        .unwrap_or_default();
    assert_eq!(stats.active_tokens, 1);
    assert_eq!(stats.active_sessions, 1);
    assert_eq!(stats.actions_last_30_days, 1);
    assert_eq!(stats.sessions_last_30_days, 2);
}

#[tokio::test]
async fn tenant_accounts_can_be_upserted() {
    let store = InMemorySupportAccessStore::new();
    let tenant_id = TenantId::new();
    store
        .upsert_tenant(TenantAccount {
            tenant_id,
            name: "Acme".to_owned(),
            slug: "acme".to_owned(),
            is_active: true,
        })
        .await;

    let found = store.find_account(tenant_id).await.unwrap_or_default();
    assert_eq!(found.map(|account| account.slug), Some("acme".to_owned()));
    assert!(matches!(store.find_account(TenantId::new()).await, Ok(None)));
}
