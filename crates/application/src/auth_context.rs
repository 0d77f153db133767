use warden_core::{AppError, AppResult, TenantId, UserIdentity};

use crate::support_access_ports::ImpersonationContext;

/// Authenticated caller of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Regular tenant user signed in through the tenant auth system.
    Tenant(UserIdentity),
    /// Support operator acting through an impersonation session.
    Impersonation(ImpersonationContext),
}

impl AuthContext {
    /// Returns the tenant the caller acts in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        match self {
            Self::Tenant(user) => user.tenant_id(),
            Self::Impersonation(context) => context.tenant_id(),
        }
    }

    /// Returns the tenant user, refusing impersonated callers.
    pub fn require_tenant_user(&self) -> AppResult<&UserIdentity> {
        match self {
            Self::Tenant(user) => Ok(user),
            Self::Impersonation(_) => Err(AppError::Forbidden(
                "support sessions cannot perform this operation".to_owned(),
            )),
        }
    }

    /// Returns the impersonation context, refusing tenant users.
    pub fn require_impersonation(&self) -> AppResult<&ImpersonationContext> {
        match self {
            Self::Impersonation(context) => Ok(context),
            Self::Tenant(_) => Err(AppError::SessionRequired(
                "support session credential is required".to_owned(),
            )),
        }
    }
}
