//! Generation and fingerprinting of opaque support access secrets.
//!
//! Secrets are 256 random bits, base64url-encoded behind a fixed prefix.
//! Only the SHA-256 digest and a short display prefix are ever stored.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use warden_core::{AppError, AppResult};

/// Human-recognizable prefix of every access token secret.
pub const ACCESS_TOKEN_PREFIX: &str = "sat_";

/// Number of leading secret characters kept for display.
pub const DISPLAY_PREFIX_LEN: usize = 12;

const SECRET_BYTES: usize = 32;

/// Freshly generated secret with its stored fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSecret {
    /// Raw secret, returned to the issuer once.
    pub secret: String,
    /// Display prefix.
    pub prefix: String,
    /// SHA-256 hex digest.
    pub hash: String,
}

/// Generates a new access token secret.
pub fn generate_secret() -> AppResult<GeneratedSecret> {
    let mut bytes = [0u8; SECRET_BYTES];
    getrandom::fill(&mut bytes).map_err(|error| {
        AppError::Internal(format!("failed to generate support access token: {error}"))
    })?;

    let secret = format!("{ACCESS_TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes));
    let prefix = secret.chars().take(DISPLAY_PREFIX_LEN).collect();
    let hash = hash_secret(&secret);

    Ok(GeneratedSecret {
        secret,
        prefix,
        hash,
    })
}

/// Computes the SHA-256 hex digest of a secret or credential.
#[must_use]
pub fn hash_secret(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Returns whether `raw` has the shape of an access token secret.
#[must_use]
pub fn is_well_formed(raw: &str) -> bool {
    raw.strip_prefix(ACCESS_TOKEN_PREFIX)
        .and_then(|body| URL_SAFE_NO_PAD.decode(body).ok())
        .is_some_and(|bytes| bytes.len() == SECRET_BYTES)
}

/// Derives the operator fingerprint stored on a session.
#[must_use]
pub fn operator_identifier(
    operator_name: &str,
    operator_email: Option<&str>,
    at: DateTime<Utc>,
) -> String {
    let seed = format!(
        "{operator_name}-{}-{}",
        operator_email.unwrap_or_default(),
        at.timestamp_millis()
    );
    let mut identifier = hash_secret(&seed);
    identifier.truncate(16);
    identifier
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{
        ACCESS_TOKEN_PREFIX, DISPLAY_PREFIX_LEN, generate_secret, hash_secret, is_well_formed,
        operator_identifier,
    };

    #[test]
    fn generated_secret_has_prefix_and_matching_hash() {
        let generated = generate_secret().unwrap_or_else(|_| unreachable!());

        assert!(generated.secret.starts_with(ACCESS_TOKEN_PREFIX));
        assert_eq!(generated.prefix.len(), DISPLAY_PREFIX_LEN);
        assert!(generated.secret.starts_with(&generated.prefix));
        assert_eq!(generated.hash, hash_secret(&generated.secret));
        assert_eq!(generated.hash.len(), 64);
        assert!(is_well_formed(&generated.secret));
    }

    #[test]
    fn generated_secrets_do_not_collide() {
        let first = generate_secret().unwrap_or_else(|_| unreachable!());
        let second = generate_secret().unwrap_or_else(|_| unreachable!());
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn malformed_secrets_are_detected() {
        assert!(!is_well_formed("not-a-token"));
        assert!(!is_well_formed("sat_short"));
        assert!(!is_well_formed("sat_!!!!"));
    }

    #[test]
    fn operator_identifier_depends_on_instant() {
        let now = Utc::now();
        let first = operator_identifier("Ana", Some("ana@support.example"), now);
        let same = operator_identifier("Ana", Some("ana@support.example"), now);
        let later = operator_identifier(
            "Ana",
            Some("ana@support.example"),
            now + Duration::milliseconds(1),
        );

        assert_eq!(first.len(), 16);
        assert_eq!(first, same);
        assert_ne!(first, later);
    }
}
