use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::{AppError, AppResult};

/// Capability tags that can be granted to a support access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportScope {
    /// Read-only access to account data.
    Read,
    /// Create and edit AI agents.
    ConfigureAgents,
    /// Create and edit campaigns.
    ConfigureCampaigns,
    /// Create and edit automation workflows.
    ConfigureWorkflows,
    /// Read conversation history.
    ViewConversations,
    /// Create, edit and manage contacts.
    ManageContacts,
    /// Create, edit and manage leads.
    ManageLeads,
    /// Satisfies every other scope.
    FullAdmin,
}

impl SupportScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ConfigureAgents => "configure_agents",
            Self::ConfigureCampaigns => "configure_campaigns",
            Self::ConfigureWorkflows => "configure_workflows",
            Self::ViewConversations => "view_conversations",
            Self::ManageContacts => "manage_contacts",
            Self::ManageLeads => "manage_leads",
            Self::FullAdmin => "full_admin",
        }
    }

    /// Returns all recognized scopes.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SupportScope] = &[
            SupportScope::Read,
            SupportScope::ConfigureAgents,
            SupportScope::ConfigureCampaigns,
            SupportScope::ConfigureWorkflows,
            SupportScope::ViewConversations,
            SupportScope::ManageContacts,
            SupportScope::ManageLeads,
            SupportScope::FullAdmin,
        ];

        ALL
    }

    /// Returns the human label shown in scope pickers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Read => "Read only",
            Self::ConfigureAgents => "Configure agents",
            Self::ConfigureCampaigns => "Configure campaigns",
            Self::ConfigureWorkflows => "Configure workflows",
            Self::ViewConversations => "View conversations",
            Self::ManageContacts => "Manage contacts",
            Self::ManageLeads => "Manage leads",
            Self::FullAdmin => "Full administration",
        }
    }

    /// Returns a one-line description of what the scope allows.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Read => "View data (agents, campaigns, conversations)",
            Self::ConfigureAgents => "Create and edit AI agents",
            Self::ConfigureCampaigns => "Create and edit campaigns",
            Self::ConfigureWorkflows => "Create and edit automation workflows",
            Self::ViewConversations => "View conversation history",
            Self::ManageContacts => "Create, edit and manage contacts",
            Self::ManageLeads => "Create, edit and manage leads",
            Self::FullAdmin => "All permissions except billing and user management",
        }
    }
}

impl FromStr for SupportScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "configure_agents" => Ok(Self::ConfigureAgents),
            "configure_campaigns" => Ok(Self::ConfigureCampaigns),
            "configure_workflows" => Ok(Self::ConfigureWorkflows),
            "view_conversations" => Ok(Self::ViewConversations),
            "manage_contacts" => Ok(Self::ManageContacts),
            "manage_leads" => Ok(Self::ManageLeads),
            "full_admin" => Ok(Self::FullAdmin),
            _ => Err(AppError::Validation(format!(
                "unknown support scope '{value}'"
            ))),
        }
    }
}

/// Non-empty set of scopes granted to a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<SupportScope>);

impl ScopeSet {
    /// Creates a scope set, rejecting an empty grant.
    pub fn new(scopes: impl IntoIterator<Item = SupportScope>) -> AppResult<Self> {
        let scopes: BTreeSet<SupportScope> = scopes.into_iter().collect();
        if scopes.is_empty() {
            return Err(AppError::Validation(
                "at least one support scope is required".to_owned(),
            ));
        }

        Ok(Self(scopes))
    }

    /// Parses storage or transport values, rejecting unknown scopes.
    pub fn parse<S: AsRef<str>>(values: &[S]) -> AppResult<Self> {
        let scopes = values
            .iter()
            .map(|value| SupportScope::from_str(value.as_ref()))
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(scopes)
    }

    /// Returns whether `required` is granted directly or through `full_admin`.
    #[must_use]
    pub fn has_scope(&self, required: SupportScope) -> bool {
        self.0.contains(&SupportScope::FullAdmin) || self.0.contains(&required)
    }

    /// Returns whether any scope in `required` is granted.
    #[must_use]
    pub fn has_any_scope(&self, required: &[SupportScope]) -> bool {
        required.iter().any(|scope| self.has_scope(*scope))
    }

    /// Iterates granted scopes in stable order.
    pub fn iter(&self) -> impl Iterator<Item = SupportScope> + '_ {
        self.0.iter().copied()
    }

    /// Returns the storage values of the granted scopes.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|scope| scope.as_str().to_owned()).collect()
    }
}
