//! Support access tokens and the numeric caps that bound their lifetime.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AppError, AppResult, TenantId};

use crate::ScopeSet;

/// Derived lifecycle state of an access token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Token can be redeemed.
    Active,
    /// Token passed its expiry.
    Expired,
    /// Token was revoked by an administrator.
    Revoked,
    /// Token is flagged inactive without a revocation record.
    Inactive,
}

impl TokenStatus {
    /// Returns a stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Inactive => "inactive",
        }
    }
}

/// Long-lived credential issued by a tenant admin for one support operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Stable token id.
    pub id: Uuid,
    /// Tenant the token grants access to.
    pub tenant_id: TenantId,
    /// Subject of the admin who issued the token.
    pub created_by: String,
    /// SHA-256 digest of the raw secret.
    pub token_hash: String,
    /// Non-secret display prefix.
    pub token_prefix: String,
    /// Granted scopes.
    pub scope: ScopeSet,
    /// Current expiry.
    pub expires_at: DateTime<Utc>,
    /// Expiry at issuance, used to cap cumulative extensions.
    pub original_expires_at: DateTime<Utc>,
    /// Activity flag, cleared on revocation.
    pub is_active: bool,
    /// Revocation timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Subject of the revoking admin.
    pub revoked_by: Option<String>,
    /// Free-text revocation reason.
    pub revoke_reason: Option<String>,
    /// Number of successful redemptions into sessions.
    pub use_count: u32,
    /// Optional redemption cap.
    pub max_uses: Option<u32>,
    /// Timestamp of the last redemption.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Number of applied extensions.
    pub extension_count: u32,
    /// Maximum allowed extensions.
    pub max_extensions: u32,
    /// Timestamp of the last extension.
    pub last_extended_at: Option<DateTime<Utc>>,
    /// Subject of the admin who last extended the token.
    pub last_extended_by: Option<String>,
    /// Operator email the token is restricted to.
    pub operator_email: Option<String>,
    /// Declared operator name.
    pub operator_name: Option<String>,
    /// Free-text purpose shown to admins.
    pub purpose: Option<String>,
    /// Free-text admin notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns the token status at `now`.
    ///
    /// Precedence is revoked, then expired, then inactive.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        if self.revoked_at.is_some() {
            TokenStatus::Revoked
        } else if self.expires_at <= now {
            TokenStatus::Expired
        } else if !self.is_active {
            TokenStatus::Inactive
        } else {
            TokenStatus::Active
        }
    }

    /// Returns whether the token reached its redemption cap.
    #[must_use]
    pub fn is_usage_exhausted(&self) -> bool {
        self.max_uses
            .is_some_and(|max_uses| self.use_count >= max_uses)
    }

    /// Returns how many extensions can still be applied.
    #[must_use]
    pub fn extensions_remaining(&self) -> u32 {
        self.max_extensions.saturating_sub(self.extension_count)
    }

    /// Checks that the token can be redeemed into a new session at `now`.
    pub fn ensure_redeemable(&self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status_at(now) {
            TokenStatus::Revoked | TokenStatus::Inactive => {
                return Err(AppError::Revoked(format!(
                    "support access token '{}' has been revoked",
                    self.token_prefix
                )));
            }
            TokenStatus::Expired => {
                return Err(AppError::Expired(format!(
                    "support access token '{}' has expired",
                    self.token_prefix
                )));
            }
            TokenStatus::Active => {}
        }

        if self.is_usage_exhausted() {
            return Err(AppError::UsageExhausted(format!(
                "support access token '{}' reached its usage limit",
                self.token_prefix
            )));
        }

        Ok(())
    }

    /// Returns whether the declared operator email satisfies the token restriction.
    ///
    /// Unrestricted tokens accept any operator. Restricted tokens compare
    /// trimmed, case-insensitive emails and reject a missing email.
    #[must_use]
    pub fn accepts_operator(&self, operator_email: Option<&str>) -> bool {
        let Some(restricted_to) = self.operator_email.as_deref() else {
            return true;
        };

        operator_email.is_some_and(|email| {
            email.trim().to_lowercase() == restricted_to.trim().to_lowercase()
        })
    }
}

/// Numeric caps applied to token issuance and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTokenPolicy {
    /// Longest duration a token may be issued for.
    pub max_duration_hours: u32,
    /// Duration applied when the issuer does not specify one.
    pub default_duration_hours: u32,
    /// Extension applied when the admin does not specify one.
    pub default_extension_hours: u32,
    /// Maximum number of extensions per token.
    pub max_extensions: u32,
    /// Cumulative cap on expiry, measured from the original expiry.
    pub extension_cap_hours: u32,
}

impl Default for AccessTokenPolicy {
    fn default() -> Self {
        Self {
            max_duration_hours: 14 * 24,
            default_duration_hours: 7 * 24,
            default_extension_hours: 7 * 24,
            max_extensions: 3,
            extension_cap_hours: 28 * 24,
        }
    }
}

impl AccessTokenPolicy {
    /// Rejects a requested duration above the maximum.
    pub fn validate_duration_hours(&self, requested: Option<u32>) -> AppResult<()> {
        match requested {
            Some(hours) if hours > self.max_duration_hours => Err(AppError::Validation(format!(
                "token duration must not exceed {} hours",
                self.max_duration_hours
            ))),
            _ => Ok(()),
        }
    }

    /// Clamps a requested duration to `[1, max_duration_hours]`.
    #[must_use]
    pub fn clamp_duration_hours(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_duration_hours)
            .clamp(1, self.max_duration_hours)
    }

    /// Validates and defaults the hours requested for an extension.
    ///
    /// Requests longer than the cumulative cap are clamped to it; the
    /// resulting expiry is capped again by [`Self::extended_expiry`].
    pub fn resolve_extension_hours(&self, requested: Option<u32>) -> AppResult<u32> {
        match requested {
            Some(0) => Err(AppError::Validation(
                "additional hours must be at least 1".to_owned(),
            )),
            Some(hours) => Ok(hours.min(self.extension_cap_hours)),
            None => Ok(self.default_extension_hours),
        }
    }

    /// Returns the latest expiry a token may ever reach.
    #[must_use]
    pub fn hard_cap(&self, original_expires_at: DateTime<Utc>) -> DateTime<Utc> {
        original_expires_at
            .checked_add_signed(Duration::hours(i64::from(self.extension_cap_hours)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Computes the expiry after extending by `additional_hours`.
    #[must_use]
    pub fn extended_expiry(
        &self,
        current_expires_at: DateTime<Utc>,
        original_expires_at: DateTime<Utc>,
        additional_hours: u32,
    ) -> DateTime<Utc> {
        let hard_cap = self.hard_cap(original_expires_at);
        current_expires_at
            .checked_add_signed(Duration::hours(i64::from(additional_hours)))
            .map_or(hard_cap, |requested| requested.min(hard_cap))
    }

    /// Checks the preconditions for extending `token` at `now`.
    pub fn ensure_extendable(&self, token: &AccessToken, now: DateTime<Utc>) -> AppResult<()> {
        if token.status_at(now) != TokenStatus::Active {
            return Err(AppError::InvalidState(format!(
                "support access token '{}' is not active",
                token.token_prefix
            )));
        }

        if token.extension_count >= token.max_extensions {
            return Err(AppError::LimitExceeded(format!(
                "maximum number of extensions reached ({})",
                token.max_extensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;
    use warden_core::{AppError, TenantId};

    use super::{AccessToken, AccessTokenPolicy, TokenStatus};
    use crate::{ScopeSet, SupportScope};

    fn token() -> AccessToken {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap_or_default();
        AccessToken {
            id: Uuid::new_v4(),
            tenant_id: TenantId::new(),
            created_by: "admin-1".to_owned(),
            token_hash: "hash".to_owned(),
            token_prefix: "sat_abcdefgh".to_owned(),
            scope: ScopeSet::new([SupportScope::Read]).unwrap_or_else(|_| unreachable!()),
            expires_at: now + Duration::hours(24),
            original_expires_at: now + Duration::hours(24),
            is_active: true,
            revoked_at: None,
            revoked_by: None,
            revoke_reason: None,
            use_count: 0,
            max_uses: None,
            last_used_at: None,
            extension_count: 0,
            max_extensions: 3,
            last_extended_at: None,
            last_extended_by: None,
            operator_email: None,
            operator_name: None,
            purpose: None,
            notes: None,
            created_at: now,
        }
    }

    #[test]
    fn revoked_takes_precedence_over_expired() {
        let mut token = token();
        token.revoked_at = Some(token.created_at);
        token.is_active = false;

        let later = token.expires_at + Duration::hours(1);
        assert_eq!(token.status_at(later), TokenStatus::Revoked);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let token = token();
        assert_eq!(token.status_at(token.expires_at), TokenStatus::Expired);
        assert_eq!(
            token.status_at(token.expires_at - Duration::seconds(1)),
            TokenStatus::Active
        );
    }

    #[test]
    fn exhausted_token_is_not_redeemable() {
        let mut token = token();
        token.max_uses = Some(1);
        token.use_count = 1;

        let result = token.ensure_redeemable(token.created_at);
        assert!(matches!(result, Err(AppError::UsageExhausted(_))));
    }

    #[test]
    fn operator_restriction_ignores_case_and_whitespace() {
        let mut token = token();
        token.operator_email = Some("Ana@Support.example".to_owned());

        assert!(token.accepts_operator(Some("  ana@support.example ")));
        assert!(!token.accepts_operator(Some("bob@support.example")));
        assert!(!token.accepts_operator(None));
    }

    #[test]
    fn duration_is_clamped_and_defaulted() {
        let policy = AccessTokenPolicy::default();
        assert_eq!(policy.clamp_duration_hours(None), 168);
        assert_eq!(policy.clamp_duration_hours(Some(0)), 1);
        assert_eq!(policy.clamp_duration_hours(Some(10_000)), 336);
        assert!(policy.validate_duration_hours(Some(337)).is_err());
        assert!(policy.validate_duration_hours(Some(336)).is_ok());
    }

    #[test]
    fn extension_never_passes_hard_cap() {
        let policy = AccessTokenPolicy::default();
        let token = token();

        let mut expires_at = token.expires_at;
        for _ in 0..10 {
            expires_at = policy.extended_expiry(expires_at, token.original_expires_at, 500);
        }

        assert_eq!(expires_at, policy.hard_cap(token.original_expires_at));
    }

    #[test]
    fn extension_limit_is_enforced() {
        let policy = AccessTokenPolicy::default();
        let mut token = token();
        token.extension_count = token.max_extensions;

        let result = policy.ensure_extendable(&token, token.created_at);
        assert!(matches!(result, Err(AppError::LimitExceeded(_))));
    }

    #[test]
    fn expired_token_cannot_be_extended() {
        let policy = AccessTokenPolicy::default();
        let token = token();

        let result = policy.ensure_extendable(&token, token.expires_at);
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn zero_extension_hours_are_rejected() {
        let policy = AccessTokenPolicy::default();
        assert!(policy.resolve_extension_hours(Some(0)).is_err());
        assert_eq!(policy.resolve_extension_hours(None).unwrap_or_default(), 168);
    }

    #[test]
    fn oversized_extension_is_clamped_to_hard_cap() {
        let policy = AccessTokenPolicy::default();
        let token = token();

        assert_eq!(
            policy.resolve_extension_hours(Some(u32::MAX)).unwrap_or_default(),
            policy.extension_cap_hours
        );
        assert_eq!(
            policy.extended_expiry(token.expires_at, token.original_expires_at, u32::MAX),
            policy.hard_cap(token.original_expires_at)
        );
    }
}
