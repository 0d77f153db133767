use crate::{RequestMethod, ResourceType, SupportScope};

/// Declarative scope requirements for impersonated business routes.
///
/// Each entry lists the scopes of which at least one must be granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutePolicy;

impl RoutePolicy {
    /// Returns the scope that grants write access to a resource, if any.
    #[must_use]
    pub fn resource_scope(resource_type: ResourceType) -> Option<SupportScope> {
        match resource_type {
            ResourceType::AiAgents | ResourceType::KnowledgeBase => {
                Some(SupportScope::ConfigureAgents)
            }
            ResourceType::Campaigns | ResourceType::Templates => {
                Some(SupportScope::ConfigureCampaigns)
            }
            ResourceType::Workflows => Some(SupportScope::ConfigureWorkflows),
            ResourceType::Conversations => Some(SupportScope::ViewConversations),
            ResourceType::Contacts => Some(SupportScope::ManageContacts),
            ResourceType::Leads => Some(SupportScope::ManageLeads),
            ResourceType::Session | ResourceType::Other => None,
        }
    }

    /// Returns the scopes of which any one satisfies a request.
    #[must_use]
    pub fn required_scopes(
        &self,
        method: RequestMethod,
        resource_type: ResourceType,
    ) -> Vec<SupportScope> {
        match (method.is_mutating(), Self::resource_scope(resource_type)) {
            (false, Some(scope)) => vec![SupportScope::Read, scope],
            (false, None) => vec![SupportScope::Read],
            (true, Some(scope)) => vec![scope],
            (true, None) => vec![SupportScope::FullAdmin],
        }
    }
}
