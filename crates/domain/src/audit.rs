use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use warden_core::{AppError, TenantId};

/// HTTP methods an impersonated request can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    /// `GET`.
    Get,
    /// `HEAD`.
    Head,
    /// `OPTIONS`.
    Options,
    /// `POST`.
    Post,
    /// `PUT`.
    Put,
    /// `PATCH`.
    Patch,
    /// `DELETE`.
    Delete,
}

impl RequestMethod {
    /// Returns the canonical upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns whether the method mutates state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl FromStr for RequestMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unsupported http method '{value}'"
            ))),
        }
    }
}

/// Kind of action recorded in the support audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportActionType {
    /// Read request.
    View,
    /// Resource creation.
    Create,
    /// Resource update.
    Update,
    /// Resource deletion.
    Delete,
    /// Operator redeemed a token into a session.
    SessionStart,
    /// Operator ended their session.
    SessionEnd,
}

impl SupportActionType {
    /// Returns a stable storage value for this action type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
        }
    }

    /// Maps a request method to the action it performs.
    #[must_use]
    pub fn from_method(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get | RequestMethod::Head | RequestMethod::Options => Self::View,
            RequestMethod::Post => Self::Create,
            RequestMethod::Put | RequestMethod::Patch => Self::Update,
            RequestMethod::Delete => Self::Delete,
        }
    }
}

impl FromStr for SupportActionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "session_start" => Ok(Self::SessionStart),
            "session_end" => Ok(Self::SessionEnd),
            _ => Err(AppError::Validation(format!(
                "unknown support action type '{value}'"
            ))),
        }
    }
}

/// Business resource touched by an impersonated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// AI agents.
    AiAgents,
    /// Outreach campaigns.
    Campaigns,
    /// Automation workflows.
    Workflows,
    /// Conversation history.
    Conversations,
    /// Leads.
    Leads,
    /// Contacts.
    Contacts,
    /// Knowledge base documents.
    KnowledgeBase,
    /// Message templates.
    Templates,
    /// The impersonation session itself.
    Session,
    /// Anything not recognized.
    Other,
}

/// Path fragments checked in order when inferring a resource type.
const RESOURCE_PATTERNS: &[(&str, ResourceType)] = &[
    ("/agents", ResourceType::AiAgents),
    ("/campaigns", ResourceType::Campaigns),
    ("/workflows", ResourceType::Workflows),
    ("/conversations", ResourceType::Conversations),
    ("/leads", ResourceType::Leads),
    ("/contacts", ResourceType::Contacts),
    ("/knowledge", ResourceType::KnowledgeBase),
    ("/templates", ResourceType::Templates),
];

impl ResourceType {
    /// Returns a stable storage value for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiAgents => "ai_agents",
            Self::Campaigns => "campaigns",
            Self::Workflows => "workflows",
            Self::Conversations => "conversations",
            Self::Leads => "leads",
            Self::Contacts => "contacts",
            Self::KnowledgeBase => "knowledge_base",
            Self::Templates => "templates",
            Self::Session => "session",
            Self::Other => "other",
        }
    }

    /// Infers the resource type from a request path.
    #[must_use]
    pub fn infer_from_path(path: &str) -> Self {
        RESOURCE_PATTERNS
            .iter()
            .find(|(pattern, _)| path.contains(pattern))
            .map_or(Self::Other, |(_, resource_type)| *resource_type)
    }

    fn path_pattern(self) -> Option<&'static str> {
        RESOURCE_PATTERNS
            .iter()
            .find(|(_, resource_type)| *resource_type == self)
            .map(|(pattern, _)| *pattern)
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ai_agents" => Ok(Self::AiAgents),
            "campaigns" => Ok(Self::Campaigns),
            "workflows" => Ok(Self::Workflows),
            "conversations" => Ok(Self::Conversations),
            "leads" => Ok(Self::Leads),
            "contacts" => Ok(Self::Contacts),
            "knowledge_base" => Ok(Self::KnowledgeBase),
            "templates" => Ok(Self::Templates),
            "session" => Ok(Self::Session),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!(
                "unknown resource type '{value}'"
            ))),
        }
    }
}

/// Resource resolved for one audited request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Inferred resource type.
    pub resource_type: ResourceType,
    /// Resource identifier, when one could be found.
    pub resource_id: Option<String>,
    /// Resource display name, when one could be found.
    pub resource_name: Option<String>,
}

impl ResourceRef {
    /// Resolves the resource from the request path and the response body.
    ///
    /// Identifiers and names in the response (`id`/`data.id`,
    /// `name`/`data.name`) win over the path segment after the collection.
    #[must_use]
    pub fn resolve(path: &str, response_body: Option<&Value>) -> Self {
        let resource_type = ResourceType::infer_from_path(path);

        let resource_id = response_body
            .and_then(|body| scalar_field(body, "id"))
            .or_else(|| id_from_path(path, resource_type));
        let resource_name = response_body.and_then(|body| scalar_field(body, "name"));

        Self {
            resource_type,
            resource_id,
            resource_name,
        }
    }
}

fn scalar_field(body: &Value, field: &str) -> Option<String> {
    let value = body
        .get(field)
        .or_else(|| body.get("data").and_then(|data| data.get(field)))?;

    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn id_from_path(path: &str, resource_type: ResourceType) -> Option<String> {
    let pattern = resource_type.path_pattern()?;
    let start = path.find(pattern)? + pattern.len();
    let rest = path[start..].strip_prefix('/')?;
    rest.split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
}

/// One immutable record of an action taken during an impersonation session.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportAuditEntry {
    /// Stable entry id.
    pub id: Uuid,
    /// Session that performed the action.
    pub session_id: Uuid,
    /// Token the session was redeemed from.
    pub token_id: Uuid,
    /// Tenant being impersonated.
    pub tenant_id: TenantId,
    /// Kind of action.
    pub action_type: SupportActionType,
    /// Resource touched.
    pub resource_type: ResourceType,
    /// Resource identifier.
    pub resource_id: Option<String>,
    /// Resource display name.
    pub resource_name: Option<String>,
    /// Redacted structured details (path and query).
    pub action_details: Option<Value>,
    /// Requested endpoint.
    pub endpoint: Option<String>,
    /// HTTP method.
    pub http_method: Option<String>,
    /// Redacted request body summary.
    pub request_body_summary: Option<Value>,
    /// Response status returned to the operator.
    pub response_status: Option<u16>,
    /// Client IP.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{RequestMethod, ResourceRef, ResourceType, SupportActionType};

    #[test]
    fn resource_type_is_inferred_in_declared_order() {
        assert_eq!(
            ResourceType::infer_from_path("/api/agents/42"),
            ResourceType::AiAgents
        );
        assert_eq!(
            ResourceType::infer_from_path("/api/knowledge/docs"),
            ResourceType::KnowledgeBase
        );
        assert_eq!(
            ResourceType::infer_from_path("/api/campaigns/7/contacts"),
            ResourceType::Campaigns
        );
        assert_eq!(
            ResourceType::infer_from_path("/api/settings"),
            ResourceType::Other
        );
    }

    #[test]
    fn response_body_wins_over_path_segment() {
        let body = json!({"data": {"id": 99, "name": "Welcome flow"}});
        let resolved = ResourceRef::resolve("/api/workflows/12", Some(&body));

        assert_eq!(resolved.resource_type, ResourceType::Workflows);
        assert_eq!(resolved.resource_id.as_deref(), Some("99"));
        assert_eq!(resolved.resource_name.as_deref(), Some("Welcome flow"));
    }

    #[test]
    fn path_segment_is_used_without_response_id() {
        let resolved = ResourceRef::resolve("/api/contacts/c-17/notes", None);
        assert_eq!(resolved.resource_id.as_deref(), Some("c-17"));
        assert_eq!(resolved.resource_name, None);

        let collection = ResourceRef::resolve("/api/contacts", None);
        assert_eq!(collection.resource_id, None);
    }

    #[test]
    fn action_type_follows_method() {
        assert_eq!(
            SupportActionType::from_method(RequestMethod::Get),
            SupportActionType::View
        );
        assert_eq!(
            SupportActionType::from_method(RequestMethod::Patch),
            SupportActionType::Update
        );
        assert_eq!(
            SupportActionType::from_method(RequestMethod::Delete),
            SupportActionType::Delete
        );
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("post".parse::<RequestMethod>().ok(), Some(RequestMethod::Post));
        assert!("TRACE".parse::<RequestMethod>().is_err());
    }
}
