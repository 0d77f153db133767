use serde_json::json;
use warden_core::{AppError, AppResult};
use warden_domain::{REDACTED_MARKER, RequestMethod, ResourceType, SupportActionType};

use crate::test_support::Harness;
use crate::ImpersonationContext;

async fn context_with_scope(harness: &Harness, scope: &[&str]) -> AppResult<ImpersonationContext> {
    let issued = harness.issue(Harness::token_input(scope)).await;
    let started = harness.authenticate(&issued.raw_secret, None).await?;
    Ok(harness.context(&started).await)
}

#[tokio::test]
async fn missing_or_unknown_credentials_are_rejected() {
    let harness = Harness::new().await;

    let missing = harness.gateway.authenticate(None).await;
    assert!(matches!(missing, Err(AppError::SessionRequired(_))));

    let blank = harness.gateway.authenticate(Some("  ")).await;
    assert!(matches!(blank, Err(AppError::SessionRequired(_))));

    let forged = harness.gateway.authenticate(Some("forged.credential")).await;
    assert!(matches!(forged, Err(AppError::SessionInvalid(_))));
}

#[tokio::test]
async fn read_scope_forwards_reads_and_records_the_resolved_resource() -> AppResult<()> {
    let harness = Harness::new().await;
    let context = context_with_scope(&harness, &["read"]).await?;

    let mut request = Harness::request(RequestMethod::Get, "/agents/agent-7", None);
    request.query = Some("expand=tools".to_owned());
    request
        .query_params
        .insert("expand".to_owned(), json!("tools"));
    let outcome = harness.gateway.process(&context, request).await;

    assert!(matches!(&outcome.result, Ok(response) if response.status == 200));
    let forwarded = harness.forwarder.requests().await;
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].tenant_id, harness.tenant_id);
    assert_eq!(forwarded[0].session_id, context.session.id);
    assert_eq!(forwarded[0].query.as_deref(), Some("expand=tools"));

    let audit = outcome.audit;
    assert_eq!(audit.action_type, SupportActionType::View);
    assert_eq!(audit.resource.resource_type, ResourceType::AiAgents);
    assert_eq!(audit.resource.resource_id.as_deref(), Some("agent-7"));
    assert_eq!(audit.resource.resource_name.as_deref(), Some("Greeter"));
    assert_eq!(audit.endpoint.as_deref(), Some("/api/agents/agent-7?expand=tools"));
    assert_eq!(audit.response_status, Some(200));
    assert_eq!(
        audit.action_details,
        Some(json!({ "path": "/agents/agent-7", "query": { "expand": "tools" } }))
    );
    Ok(())
}

#[tokio::test]
async fn writes_without_the_resource_scope_are_denied_and_recorded() -> AppResult<()> {
    let harness = Harness::new().await;
    let context = context_with_scope(&harness, &["read"]).await?;

    let outcome = harness
        .gateway
        .process(
            &context,
            Harness::request(RequestMethod::Post, "/agents", Some(json!({ "name": "New" }))),
        )
        .await;

    assert!(matches!(outcome.result, Err(AppError::InsufficientScope(_))));
    assert_eq!(outcome.audit.response_status, Some(403));
    assert_eq!(outcome.audit.action_type, SupportActionType::Create);
    assert!(harness.forwarder.requests().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn resource_scope_alone_does_not_grant_unrelated_reads() -> AppResult<()> {
    let harness = Harness::new().await;
    let context = context_with_scope(&harness, &["configure_agents"]).await?;

    assert!(
        harness
            .gateway
            .authorize(&context, RequestMethod::Put, "/agents/a-1")
            .is_ok()
    );
    assert!(
        harness
            .gateway
            .authorize(&context, RequestMethod::Get, "/knowledge/doc-1")
            .is_ok()
    );
    let leads = harness
        .gateway
        .authorize(&context, RequestMethod::Get, "/leads");
    assert!(matches!(leads, Err(AppError::InsufficientScope(_))));
    Ok(())
}

#[tokio::test]
async fn forbidden_actions_are_blocked_even_for_full_admin() -> AppResult<()> {
    let harness = Harness::new().await;
    let context = context_with_scope(&harness, &["full_admin"]).await?;

    for (method, path) in [
        (RequestMethod::Post, "/users"),
        (RequestMethod::Delete, "/users/u42"),
        (RequestMethod::Patch, "/billing/plan"),
        (RequestMethod::Post, "/support-access/tokens"),
        (RequestMethod::Put, "/api-keys/k-1"),
    ] {
        let outcome = harness
            .gateway
            .process(&context, Harness::request(method, path, None))
            .await;
        assert!(matches!(outcome.result, Err(AppError::ForbiddenAction(_))));
        assert_eq!(outcome.audit.response_status, Some(403));
    }

    assert!(
        harness
            .gateway
            .authorize(&context, RequestMethod::Get, "/billing")
            .is_ok()
    );
    assert!(harness.forwarder.requests().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn dot_segments_cannot_reroute_past_scope_or_deny_list() -> AppResult<()> {
    let harness = Harness::new().await;
    let agents_only = context_with_scope(&harness, &["configure_agents"]).await?;
    let full_admin = context_with_scope(&harness, &["full_admin"]).await?;

    for (context, path) in [
        (&agents_only, "/agents/../leads/5"),
        (&agents_only, "/agents/%2e%2e/leads/5"),
        (&full_admin, "/users/x/.."),
        (&full_admin, "/contacts/./../users"),
    ] {
        let outcome = harness
            .gateway
            .process(context, Harness::request(RequestMethod::Post, path, None))
            .await;
        assert!(matches!(outcome.result, Err(AppError::ForbiddenAction(_))));
        assert_eq!(outcome.audit.response_status, Some(403));
    }

    assert!(harness.forwarder.requests().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn recorded_actions_are_redacted_and_bump_session_counters() -> AppResult<()> {
    let harness = Harness::new().await;
    let context = context_with_scope(&harness, &["full_admin"]).await?;

    let outcome = harness
        .gateway
        .process(
            &context,
            Harness::request(
                RequestMethod::Post,
                "/agents",
                Some(json!({
                    "name": "Helper",
                    "password": "x",
                    "integration": { "api_key": "k", "region": "eu" }
                })),
            ),
        )
        .await;
    let entry = harness.audit.record(&context.session, outcome.audit).await?;

    assert_eq!(
        entry.request_body_summary,
        Some(json!({
            "name": "Helper",
            "password": REDACTED_MARKER,
            "integration": { "api_key": REDACTED_MARKER, "region": "eu" }
        }))
    );
    assert_eq!(harness.store.entries().await.len(), 1);

    let session = harness.store.session(context.session.id).await;
    assert!(session.is_some_and(|session| {
        session.actions_count == 1 && session.last_action_at == Some(entry.created_at)
    }));
    Ok(())
}

#[tokio::test]
async fn upstream_failures_are_recorded_as_bad_gateway() -> AppResult<()> {
    let harness = Harness::new().await;
    let context = context_with_scope(&harness, &["read"]).await?;
    harness.forwarder.fail_next_calls();

    let outcome = harness
        .gateway
        .process(&context, Harness::request(RequestMethod::Get, "/contacts", None))
        .await;

    assert!(matches!(outcome.result, Err(AppError::Internal(_))));
    assert_eq!(outcome.audit.response_status, Some(502));
    assert_eq!(outcome.audit.resource.resource_type, ResourceType::Contacts);
    Ok(())
}
