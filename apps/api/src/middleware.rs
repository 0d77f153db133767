use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;
use warden_application::{AuthContext, RequestContext};
use warden_core::{AppError, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

/// Session key under which the tenant auth system stores the signed-in user.
pub const SESSION_USER_KEY: &str = "warden.user";

/// Header carrying the support session credential.
pub const SUPPORT_SESSION_HEADER: &str = "x-support-session";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const REAL_IP_HEADER: &str = "x-real-ip";

/// Admits signed-in tenant users and refuses support sessions.
pub async fn require_tenant_user(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let context = match support_credential(request.headers()) {
        Some(credential) => {
            AuthContext::Impersonation(state.gateway.authenticate(Some(&credential)).await?)
        }
        None => {
            let identity = session
                .get::<UserIdentity>(SESSION_USER_KEY)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to read session identity: {error}"))
                })?
                .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
            AuthContext::Tenant(identity)
        }
    };

    let user = context.require_tenant_user()?.clone();
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Resolves the support session credential and attaches its context.
pub async fn require_support_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let credential = support_credential(request.headers());
    let context = state.gateway.authenticate(credential.as_deref()).await?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Reads the credential from `X-Support-Session`, falling back to a bearer token.
pub fn support_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_text(headers, SUPPORT_SESSION_HEADER) {
        return Some(value.to_owned());
    }

    header_text(headers, header::AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Extracts client IP and user agent for session and audit records.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip_address = header_text(headers, FORWARDED_FOR_HEADER)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| header_text(headers, REAL_IP_HEADER))
        .map(str::to_owned);

    RequestContext {
        ip_address,
        user_agent: header_text(headers, header::USER_AGENT.as_str()).map(str::to_owned),
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
