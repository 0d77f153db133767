//! Shared primitives for all Rust crates in Warden.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::{TenantRole, UserIdentity};

/// Result type used across Warden crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Tenant account identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Application error categories.
///
/// Support-access failures get their own variants so that callers can react
/// to each one specifically; see [`AppError::code`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist in the caller's tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Tenant user is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Tenant user is authenticated but blocked by role policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Support access secret is malformed or unknown.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Support access token has expired.
    #[error("expired: {0}")]
    Expired(String),

    /// Support access token has been revoked.
    #[error("revoked: {0}")]
    Revoked(String),

    /// Support access token reached its redemption cap.
    #[error("usage exhausted: {0}")]
    UsageExhausted(String),

    /// Support access token is restricted to a different operator.
    #[error("operator mismatch: {0}")]
    OperatorMismatch(String),

    /// No impersonation session credential was presented.
    #[error("session required: {0}")]
    SessionRequired(String),

    /// Impersonation session credential is invalid, expired, or ended.
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    /// Impersonation session scope does not satisfy the route requirement.
    #[error("insufficient scope: {0}")]
    InsufficientScope(String),

    /// Request hit the hard deny-list for impersonated requests.
    #[error("forbidden action: {0}")]
    ForbiddenAction(String),

    /// Support access token cannot be extended any further.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Support access token is not in a state that allows the mutation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCredential(_) => "SUPPORT_TOKEN_INVALID",
            Self::Expired(_) => "SUPPORT_TOKEN_EXPIRED",
            Self::Revoked(_) => "SUPPORT_TOKEN_REVOKED",
            Self::UsageExhausted(_) => "SUPPORT_TOKEN_EXHAUSTED",
            Self::OperatorMismatch(_) => "SUPPORT_TOKEN_RESTRICTED",
            Self::SessionRequired(_) => "SUPPORT_SESSION_REQUIRED",
            Self::SessionInvalid(_) => "SUPPORT_SESSION_INVALID",
            Self::InsufficientScope(_) => "SUPPORT_SCOPE_INSUFFICIENT",
            Self::ForbiddenAction(_) => "SUPPORT_ACTION_FORBIDDEN",
            Self::LimitExceeded(_) => "SUPPORT_TOKEN_EXTENSION_LIMIT",
            Self::InvalidState(_) => "SUPPORT_TOKEN_INVALID_STATE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether the error rejects a presented support access secret.
    #[must_use]
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_)
                | Self::Expired(_)
                | Self::Revoked(_)
                | Self::UsageExhausted(_)
        )
    }
}
