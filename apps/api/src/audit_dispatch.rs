//! Background recording of support audit entries.
//!
//! Responses never wait on audit storage. Each write is retried with a
//! growing delay and the final failure is logged at error level.

use std::time::Duration;

use tracing::{error, warn};
use warden_application::{AuditedAction, SupportAuditService};
use warden_domain::ImpersonationSession;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Records `action` on a background task.
pub fn spawn_audit_record(
    audit: SupportAuditService,
    session: ImpersonationSession,
    action: AuditedAction,
) {
    tokio::spawn(async move {
        record_with_retry(&audit, &session, action).await;
    });
}

/// Records `action`, retrying transient failures. Returns whether it was stored.
pub async fn record_with_retry(
    audit: &SupportAuditService,
    session: &ImpersonationSession,
    action: AuditedAction,
) -> bool {
    for attempt in 1..=MAX_ATTEMPTS {
        match audit.record(session, action.clone()).await {
            Ok(_) => return true,
            Err(record_error) if attempt < MAX_ATTEMPTS => {
                warn!(
                    session_id = %session.id,
                    action_type = action.action_type.as_str(),
                    attempt,
                    error = %record_error,
                    "failed to record support audit entry, retrying"
                );
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
            }
            Err(record_error) => {
                error!(
                    session_id = %session.id,
                    action_type = action.action_type.as_str(),
                    error = %record_error,
                    "dropping support audit entry after repeated failures"
                );
            }
        }
    }

    false
}
