//! Proxy route for business requests made under a support session.

use std::str::FromStr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use tracing::error;
use warden_application::{ImpersonatedRequest, ImpersonationContext};
use warden_core::AppError;
use warden_domain::RequestMethod;

use crate::audit_dispatch::spawn_audit_record;
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::middleware::request_context;
use crate::state::AppState;

const UPSTREAM_UNAVAILABLE_CODE: &str = "UPSTREAM_UNAVAILABLE";

pub async fn impersonation_proxy_handler(
    State(state): State<AppState>,
    Extension(context): Extension<ImpersonationContext>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let request = ImpersonatedRequest {
        method: RequestMethod::from_str(method.as_str())?,
        path: format!("/{}", path.trim_start_matches('/')),
        query_params: query.as_deref().map(query_params).unwrap_or_default(),
        query: query.filter(|query| !query.is_empty()),
        body: json_body(&body)?,
        request: request_context(&headers),
    };

    let outcome = state.gateway.process(&context, request).await;
    spawn_audit_record(state.audit_service.clone(), context.session, outcome.audit);

    match outcome.result {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok(match upstream.body {
                Some(body) => (status, Json(body)).into_response(),
                None => status.into_response(),
            })
        }
        Err(AppError::Internal(detail)) => {
            error!(error = %detail, "impersonated request could not reach the upstream api");
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    code: UPSTREAM_UNAVAILABLE_CODE.to_owned(),
                    message: "upstream api is unavailable".to_owned(),
                }),
            )
                .into_response())
        }
        Err(rejection) => Err(ApiError(rejection)),
    }
}

fn json_body(body: &Bytes) -> Result<Option<Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|error| AppError::Validation(format!("request body must be JSON: {error}")))
}

/// Decodes a query string; repeated keys collect into an array.
fn query_params(query: &str) -> Map<String, Value> {
    let mut params = Map::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match params.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(key.into_owned(), value);
            }
        }
    }

    params
}
