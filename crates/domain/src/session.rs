use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AppError, TenantId};

use crate::TokenStatus;

/// Reason recorded when an impersonation session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// Operator ended their own session.
    Manual,
    /// Tenant admin terminated the session.
    AdminTerminated,
    /// Parent token expired.
    TokenExpired,
    /// Parent token was revoked.
    TokenRevoked,
    /// Background sweep closed an idle session.
    Inactivity,
}

impl SessionEndReason {
    /// Returns a stable storage value for this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AdminTerminated => "admin_terminated",
            Self::TokenExpired => "token_expired",
            Self::TokenRevoked => "token_revoked",
            Self::Inactivity => "inactivity",
        }
    }

    /// Returns the cascade reason for a parent token that is no longer active.
    #[must_use]
    pub fn for_token_status(status: TokenStatus) -> Option<Self> {
        match status {
            TokenStatus::Active => None,
            TokenStatus::Expired => Some(Self::TokenExpired),
            TokenStatus::Revoked | TokenStatus::Inactive => Some(Self::TokenRevoked),
        }
    }
}

impl FromStr for SessionEndReason {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manual" => Ok(Self::Manual),
            "admin_terminated" => Ok(Self::AdminTerminated),
            "token_expired" => Ok(Self::TokenExpired),
            "token_revoked" => Ok(Self::TokenRevoked),
            "inactivity" => Ok(Self::Inactivity),
            _ => Err(AppError::Validation(format!(
                "unknown session end reason '{value}'"
            ))),
        }
    }
}

/// Working period of one operator, bound to one redemption of an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationSession {
    /// Stable session id.
    pub id: Uuid,
    /// Parent access token.
    pub token_id: Uuid,
    /// Tenant being impersonated.
    pub tenant_id: TenantId,
    /// Self-reported operator name.
    pub operator_name: String,
    /// Self-reported operator email.
    pub operator_email: Option<String>,
    /// Fingerprint of operator and creation instant.
    pub operator_identifier: String,
    /// SHA-256 digest of the session credential.
    pub session_token_hash: String,
    /// Client IP at authentication.
    pub ip_address: Option<String>,
    /// Client user agent at authentication.
    pub user_agent: Option<String>,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// End timestamp, set exactly once.
    pub ended_at: Option<DateTime<Utc>>,
    /// Why the session ended.
    pub end_reason: Option<SessionEndReason>,
    /// Activity flag, cleared together with `ended_at`.
    pub is_active: bool,
    /// Number of gated actions recorded.
    pub actions_count: u32,
    /// Timestamp of the last gated action.
    pub last_action_at: Option<DateTime<Utc>>,
}

impl ImpersonationSession {
    /// Ends the session. Returns `false` when it had already ended.
    pub fn end(&mut self, now: DateTime<Utc>, reason: SessionEndReason) -> bool {
        if !self.is_active {
            return false;
        }

        self.is_active = false;
        self.ended_at = Some(now);
        self.end_reason = Some(reason);
        true
    }

    /// Returns the last instant the session showed activity.
    #[must_use]
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_action_at.unwrap_or(self.started_at)
    }

    /// Records one gated action.
    pub fn record_action(&mut self, now: DateTime<Utc>) {
        self.actions_count = self.actions_count.saturating_add(1);
        self.last_action_at = Some(now);
    }
}
