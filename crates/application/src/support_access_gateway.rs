//! Access Gateway: the request-time pipeline for impersonated requests.
//!
//! Authenticate, authorize against the route policy, block forbidden
//! categories, forward, and hand back the action to record. Recording is
//! left to the caller so that audit storage never delays the response.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use warden_core::{AppError, AppResult};
use warden_domain::{
    ForbiddenActionGuard, RequestMethod, ResourceRef, ResourceType, RoutePolicy,
    SupportActionType, SupportScope, ensure_canonical_path,
};

use crate::support_access_ports::{
    AuditedAction, ImpersonationContext, RequestContext, UpstreamForwarder, UpstreamRequest,
    UpstreamResponse,
};
use crate::{Clock, ImpersonationSessionService};

/// Status recorded when the upstream call itself failed.
const UPSTREAM_FAILURE_STATUS: u16 = 502;

/// Status recorded for requests denied by scope or deny-list.
const DENIED_STATUS: u16 = 403;

/// Business request arriving under an impersonation session.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpersonatedRequest {
    /// HTTP method.
    pub method: RequestMethod,
    /// Path below the business API root, starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// Decoded query parameters.
    pub query_params: Map<String, Value>,
    /// JSON request body.
    pub body: Option<Value>,
    /// Client request context.
    pub request: RequestContext,
}

impl ImpersonatedRequest {
    fn endpoint(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("/api{}?{query}", self.path),
            _ => format!("/api{}", self.path),
        }
    }
}

/// Result of one pass through the gateway, with the action to record.
#[derive(Debug)]
pub struct GatewayOutcome {
    /// Upstream response, or the reason the request was refused.
    pub result: AppResult<UpstreamResponse>,
    /// Action to append to the audit log.
    pub audit: AuditedAction,
}

/// Application service composing the impersonation pipeline.
#[derive(Clone)]
pub struct SupportAccessGateway {
    sessions: ImpersonationSessionService,
    forwarder: Arc<dyn UpstreamForwarder>,
    forbidden: ForbiddenActionGuard,
    policy: RoutePolicy,
    clock: Arc<dyn Clock>,
}

impl SupportAccessGateway {
    /// Creates a new gateway.
    #[must_use]
    pub fn new(
        sessions: ImpersonationSessionService,
        forwarder: Arc<dyn UpstreamForwarder>,
        forbidden: ForbiddenActionGuard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            forwarder,
            forbidden,
            policy: RoutePolicy,
            clock,
        }
    }

    /// Resolves a presented session credential to its context.
    pub async fn authenticate(&self, credential: Option<&str>) -> AppResult<ImpersonationContext> {
        let credential = credential
            .map(str::trim)
            .filter(|credential| !credential.is_empty())
            .ok_or_else(|| {
                AppError::SessionRequired("support session credential is required".to_owned())
            })?;

        self.sessions
            .validate_session(credential)
            .await?
            .ok_or_else(|| {
                AppError::SessionInvalid("support session is invalid or has expired".to_owned())
            })
    }

    /// Checks scope and the forbidden-action deny-list for a request.
    ///
    /// Paths the upstream URL would rewrite are refused before either check.
    pub fn authorize(
        &self,
        context: &ImpersonationContext,
        method: RequestMethod,
        path: &str,
    ) -> AppResult<()> {
        ensure_canonical_path(path)?;

        let resource_type = ResourceType::infer_from_path(path);
        let required = self.policy.required_scopes(method, resource_type);
        if !context.scope().has_any_scope(&required) {
            return Err(AppError::InsufficientScope(format!(
                "one of the scopes [{}] is required",
                scope_list(&required)
            )));
        }

        self.forbidden.check(method, path)
    }

    /// Authorizes and forwards a request, returning the response together
    /// with the action to record. Denied requests are recorded too.
    pub async fn process(
        &self,
        context: &ImpersonationContext,
        request: ImpersonatedRequest,
    ) -> GatewayOutcome {
        let result = match self.authorize(context, request.method, &request.path) {
            Ok(()) => {
                self.forwarder
                    .forward(UpstreamRequest {
                        method: request.method,
                        path: request.path.clone(),
                        query: request.query.clone(),
                        body: request.body.clone(),
                        tenant_id: context.tenant_id(),
                        session_id: context.session.id,
                        operator_identifier: context.session.operator_identifier.clone(),
                    })
                    .await
            }
            Err(error) => Err(error),
        };

        let (response_status, response_body) = match &result {
            Ok(response) => (response.status, response.body.as_ref()),
            Err(AppError::InsufficientScope(_) | AppError::ForbiddenAction(_)) => {
                (DENIED_STATUS, None)
            }
            Err(_) => (UPSTREAM_FAILURE_STATUS, None),
        };

        let audit = AuditedAction {
            action_type: SupportActionType::from_method(request.method),
            resource: ResourceRef::resolve(&request.path, response_body),
            action_details: Some(json!({
                "path": request.path,
                "query": Value::Object(request.query_params.clone()),
            })),
            endpoint: Some(request.endpoint()),
            http_method: Some(request.method.as_str().to_owned()),
            request_body: request.body,
            response_status: Some(response_status),
            request: request.request,
            occurred_at: self.clock.now(),
        };

        GatewayOutcome { result, audit }
    }
}

fn scope_list(scopes: &[SupportScope]) -> String {
    scopes
        .iter()
        .map(SupportScope::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests;
