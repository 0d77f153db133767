//! Operator-facing surface: redeem a token, end the own session, read the scope catalog.

use warden_core::{AppError, AppResult, NonEmptyString};
use warden_domain::{ImpersonationSession, SessionEndReason, SupportScope};

use crate::support_access_ports::{
    ImpersonationContext, OperatorAuthenticationInput, RequestContext, ScopeDescriptor,
    StartedSession,
};
use crate::{AccessTokenService, ImpersonationSessionService};

/// Application service for support operators.
#[derive(Clone)]
pub struct OperatorAccessService {
    tokens: AccessTokenService,
    sessions: ImpersonationSessionService,
}

impl OperatorAccessService {
    /// Creates a new operator service.
    #[must_use]
    pub fn new(tokens: AccessTokenService, sessions: ImpersonationSessionService) -> Self {
        Self { tokens, sessions }
    }

    /// Redeems a raw token into a new impersonation session.
    ///
    /// Rejections carry the specific reason; a token restricted to another
    /// operator fails with [`AppError::OperatorMismatch`] and creates nothing.
    pub async fn authenticate(
        &self,
        input: OperatorAuthenticationInput,
        request: RequestContext,
    ) -> AppResult<StartedSession> {
        let operator_name = NonEmptyString::new(input.operator_name)
            .map_err(|_| AppError::Validation("operator name is required".to_owned()))?;
        let operator_email = input
            .operator_email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());

        let (token, tenant) = self.tokens.verify(&input.token).await?;

        if !token.accepts_operator(operator_email.as_deref()) {
            return Err(AppError::OperatorMismatch(format!(
                "support access token '{}' is restricted to another operator",
                token.token_prefix
            )));
        }

        self.sessions
            .create_session(
                &token,
                tenant,
                operator_name.as_str(),
                operator_email.as_deref(),
                request,
            )
            .await
    }

    /// Ends the caller's own session.
    pub async fn end_own_session(
        &self,
        context: &ImpersonationContext,
    ) -> AppResult<ImpersonationSession> {
        self.sessions
            .end_session(
                context.tenant_id(),
                context.session.id,
                SessionEndReason::Manual,
            )
            .await
    }

    /// Returns the catalog of recognized scopes.
    #[must_use]
    pub fn scope_catalog(&self) -> Vec<ScopeDescriptor> {
        SupportScope::all()
            .iter()
            .map(|scope| ScopeDescriptor {
                scope: *scope,
                label: scope.label(),
                description: scope.description(),
            })
            .collect()
    }
}
