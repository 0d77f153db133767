use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;
use warden_core::{AppResult, TenantId};
use warden_domain::RequestMethod;

/// Impersonated request forwarded to the business API.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    /// HTTP method.
    pub method: RequestMethod,
    /// Path below the upstream API root, starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// JSON request body.
    pub body: Option<Value>,
    /// Impersonated tenant.
    pub tenant_id: TenantId,
    /// Session performing the request.
    pub session_id: Uuid,
    /// Operator fingerprint.
    pub operator_identifier: String,
}

/// Upstream response relayed back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, JSON when the upstream returned JSON.
    pub body: Option<Value>,
}

/// Port for executing impersonated business requests.
#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    /// Executes one request against the business API.
    async fn forward(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse>;
}
