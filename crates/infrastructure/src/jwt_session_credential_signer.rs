//! HS256 session credentials for impersonation sessions.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_application::{SessionClaims, SessionCredentialSigner};
use warden_core::{AppError, AppResult, TenantId};

/// Type marker carried by every session credential.
const SESSION_CREDENTIAL_TYPE: &str = "support_session";

/// Minimum accepted length of the signing secret.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct SessionCredentialClaims {
    typ: String,
    jti: Uuid,
    token_id: Uuid,
    tenant_id: Uuid,
    operator_name: String,
    operator_identifier: String,
    impersonating: bool,
    iat: i64,
    exp: i64,
}

/// Signs session credentials as HS256 JWTs.
#[derive(Clone)]
pub struct JwtSessionCredentialSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionCredentialSigner {
    /// Creates a signer from a shared secret of at least 32 characters.
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::Validation(format!(
                "support session secret must be at least {MIN_SESSION_SECRET_LEN} characters"
            )));
        }

        // Expiry is checked against the injected clock in `verify`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }
}

impl SessionCredentialSigner for JwtSessionCredentialSigner {
    fn sign(&self, claims: &SessionClaims) -> AppResult<String> {
        let payload = SessionCredentialClaims {
            typ: SESSION_CREDENTIAL_TYPE.to_owned(),
            jti: claims.session_id,
            token_id: claims.token_id,
            tenant_id: claims.tenant_id.as_uuid(),
            operator_name: claims.operator_name.clone(),
            operator_identifier: claims.operator_identifier.clone(),
            impersonating: true,
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key).map_err(|error| {
            AppError::Internal(format!("failed to sign support session credential: {error}"))
        })
    }

    fn verify(&self, credential: &str, now: DateTime<Utc>) -> Option<SessionClaims> {
        let claims = decode::<SessionCredentialClaims>(
            credential,
            &self.decoding_key,
            &self.validation,
        )
        .ok()?
        .claims;

        if claims.typ != SESSION_CREDENTIAL_TYPE || !claims.impersonating {
            return None;
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0)?;
        if expires_at <= now {
            return None;
        }

        Some(SessionClaims {
            session_id: claims.jti,
            token_id: claims.token_id,
            tenant_id: TenantId::from_uuid(claims.tenant_id),
            operator_name: claims.operator_name,
            operator_identifier: claims.operator_identifier,
            issued_at: DateTime::from_timestamp(claims.iat, 0)?,
            expires_at,
        })
    }
}
