use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_core::{AppResult, TenantId};

/// Payload embedded in a signed session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Session id.
    pub session_id: Uuid,
    /// Parent token id.
    pub token_id: Uuid,
    /// Impersonated tenant.
    pub tenant_id: TenantId,
    /// Self-reported operator name.
    pub operator_name: String,
    /// Derived operator fingerprint.
    pub operator_identifier: String,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Expiry of the credential.
    pub expires_at: DateTime<Utc>,
}

/// Port for signing and verifying session credentials.
pub trait SessionCredentialSigner: Send + Sync {
    /// Signs claims into an opaque bearer credential.
    fn sign(&self, claims: &SessionClaims) -> AppResult<String>;

    /// Verifies signature, type marker and expiry against `now`.
    ///
    /// Returns `None` for any credential that does not verify.
    fn verify(&self, credential: &str, now: DateTime<Utc>) -> Option<SessionClaims>;
}
