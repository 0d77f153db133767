use std::str::FromStr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use warden_application::{
    AuditedAction, CreateAccessTokenInput, ImpersonationContext, OperatorAuthenticationInput,
};
use warden_core::{AppError, UserIdentity};
use warden_domain::SupportActionType;

use crate::audit_dispatch::spawn_audit_record;
use crate::dto::{
    AccessTokenResponse, AuditLogPageResponse, AuthenticateOperatorRequest,
    CreateAccessTokenRequest, EndedSessionResponse, ExtendAccessTokenRequest,
    IssuedAccessTokenResponse, OperatorSessionResponse, RevokeAccessTokenRequest,
    ScopeDescriptorResponse, SessionInfoResponse, SessionResponse, SupportAccessStatsResponse,
};
use crate::error::ApiResult;
use crate::middleware::request_context;
use crate::state::AppState;

mod audit;
mod operator;
mod sessions;
mod tokens;

pub use audit::{list_audit_log_handler, support_access_stats_handler};
pub use operator::{
    authenticate_operator_handler, end_own_session_handler, scope_catalog_handler,
    session_info_handler,
};
pub use sessions::{end_session_handler, list_sessions_handler};
pub use tokens::{
    create_token_handler, extend_token_handler, get_token_handler, list_tokens_handler,
    revoke_token_handler,
};

fn parse_id(value: &str, label: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::Validation(format!("invalid {label} '{value}'")))
}

fn parse_timestamp(value: &str, label: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("invalid {label} '{value}'")))
}

/// Decodes an optional JSON body, using the default payload when it is empty.
fn optional_json<T>(body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|error| AppError::Validation(format!("invalid request body: {error}")))
}
