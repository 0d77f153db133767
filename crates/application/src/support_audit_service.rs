//! Audit Recorder: redacted, append-only records of impersonated actions.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;
use warden_core::{AppResult, TenantId};
use warden_domain::{
    ImpersonationSession, REDACTION_SIZE_LIMIT, SupportAuditEntry, summarize_payload,
};

use crate::Clock;
use crate::support_access_ports::{
    AuditLogPage, AuditLogQuery, AuditedAction, NewAuditEntry, SupportAccessStats,
    SupportAuditRepository,
};

/// Trailing window used by the stats view.
const STATS_WINDOW_DAYS: i64 = 30;

/// Application service for the support audit log.
#[derive(Clone)]
pub struct SupportAuditService {
    repository: Arc<dyn SupportAuditRepository>,
    clock: Arc<dyn Clock>,
}

impl SupportAuditService {
    /// Creates a new audit service.
    #[must_use]
    pub fn new(repository: Arc<dyn SupportAuditRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Redacts and appends one action performed during `session`.
    pub async fn record(
        &self,
        session: &ImpersonationSession,
        action: AuditedAction,
    ) -> AppResult<SupportAuditEntry> {
        let AuditedAction {
            action_type,
            resource,
            action_details,
            endpoint,
            http_method,
            request_body,
            response_status,
            request,
            occurred_at,
        } = action;

        self.repository
            .append_entry(NewAuditEntry {
                id: Uuid::new_v4(),
                session_id: session.id,
                token_id: session.token_id,
                tenant_id: session.tenant_id,
                action_type,
                resource,
                action_details: action_details
                    .map(|details| summarize_payload(&details, REDACTION_SIZE_LIMIT)),
                endpoint,
                http_method,
                request_body_summary: request_body
                    .map(|body| summarize_payload(&body, REDACTION_SIZE_LIMIT)),
                response_status,
                request,
                created_at: occurred_at,
            })
            .await
    }

    /// Returns one page of the tenant audit log.
    pub async fn list(&self, tenant_id: TenantId, query: AuditLogQuery) -> AppResult<AuditLogPage> {
        self.repository
            .list_entries(tenant_id, &query.clamped())
            .await
    }

    /// Returns aggregate counters over the trailing 30 days.
    pub async fn stats(&self, tenant_id: TenantId) -> AppResult<SupportAccessStats> {
        let now = self.clock.now();
        self.repository
            .access_stats(tenant_id, now, now - Duration::days(STATS_WINDOW_DAYS))
            .await
    }
}
