//! Domain entities and invariants for support access impersonation.

#![forbid(unsafe_code)]

mod access_token;
mod audit;
mod forbidden;
mod redaction;
mod route_policy;
mod scope;
mod session;

pub use access_token::{AccessToken, AccessTokenPolicy, TokenStatus};
pub use audit::{RequestMethod, ResourceRef, ResourceType, SupportActionType, SupportAuditEntry};
pub use forbidden::{ForbiddenActionGuard, ensure_canonical_path};
pub use redaction::{REDACTED_MARKER, REDACTION_SIZE_LIMIT, redact_sensitive, summarize_payload};
pub use route_policy::RoutePolicy;
pub use scope::{ScopeSet, SupportScope};
pub use session::{ImpersonationSession, SessionEndReason};
