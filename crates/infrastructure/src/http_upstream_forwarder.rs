use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use warden_application::{UpstreamForwarder, UpstreamRequest, UpstreamResponse};
use warden_core::{AppError, AppResult};

/// Header carrying the impersonated tenant id.
pub const TENANT_HEADER: &str = "x-warden-tenant-id";
/// Header carrying the support session id.
pub const SESSION_HEADER: &str = "x-warden-session-id";
/// Header carrying the operator fingerprint.
pub const OPERATOR_HEADER: &str = "x-warden-operator";
/// Header carrying the shared gateway secret.
pub const GATEWAY_SECRET_HEADER: &str = "x-warden-gateway-secret";

/// Forwards impersonated requests to the business API over HTTP.
pub struct HttpUpstreamForwarder {
    http_client: reqwest::Client,
    base_url: String,
    gateway_secret: String,
}

impl HttpUpstreamForwarder {
    /// Creates a forwarder with a per-request timeout.
    pub fn new(base_url: &str, gateway_secret: String, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build upstream http client: {error}"))
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            gateway_secret,
        })
    }

    fn url_for(&self, request: &UpstreamRequest) -> String {
        match request.query.as_deref().filter(|query| !query.is_empty()) {
            Some(query) => format!("{}/api{}?{query}", self.base_url, request.path),
            None => format!("{}/api{}", self.base_url, request.path),
        }
    }
}

#[async_trait]
impl UpstreamForwarder for HttpUpstreamForwarder {
    async fn forward(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|error| AppError::Internal(format!("invalid upstream method: {error}")))?;
        let url = self.url_for(&request);

        let mut builder = self
            .http_client
            .request(method, url.as_str())
            .header(TENANT_HEADER, request.tenant_id.to_string())
            .header(SESSION_HEADER, request.session_id.to_string())
            .header(OPERATOR_HEADER, request.operator_identifier.as_str())
            .header(GATEWAY_SECRET_HEADER, self.gateway_secret.as_str());

        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            warn!(
                session_id = %request.session_id,
                path = %request.path,
                error = %error,
                "impersonated upstream request failed"
            );
            AppError::Internal(format!("upstream request to '{url}' failed: {error}"))
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|error| {
            AppError::Internal(format!("failed to read upstream response from '{url}': {error}"))
        })?;

        let body = if bytes.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }),
            )
        };

        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;
    use warden_application::UpstreamRequest;
    use warden_core::TenantId;
    use warden_domain::RequestMethod;

    use super::HttpUpstreamForwarder;

    fn request(query: Option<&str>) -> UpstreamRequest {
        UpstreamRequest {
            method: RequestMethod::Get,
            path: "/agents/agent-7".to_owned(),
            query: query.map(str::to_owned),
            body: None,
            tenant_id: TenantId::new(),
            session_id: Uuid::new_v4(),
            operator_identifier: "0f1e2d3c4b5a6978".to_owned(),
        }
    }

    #[test]
    fn url_joins_base_api_root_path_and_query() {
        let forwarder = HttpUpstreamForwarder::new(
            "http://business.internal:8080/",
            "gateway-secret".to_owned(),
            Duration::from_secs(5),
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            forwarder.url_for(&request(Some("expand=tools"))),
            "http://business.internal:8080/api/agents/agent-7?expand=tools"
        );
        assert_eq!(
            forwarder.url_for(&request(Some(""))),
            "http://business.internal:8080/api/agents/agent-7"
        );
        assert_eq!(
            forwarder.url_for(&request(None)),
            "http://business.internal:8080/api/agents/agent-7"
        );
    }
}
