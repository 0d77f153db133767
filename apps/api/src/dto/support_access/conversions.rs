use chrono::{DateTime, Utc};
use warden_application::{
    AccessTokenSummary, AuditLogPage, AuditLogRecord, ImpersonationContext, IssuedAccessToken,
    ScopeDescriptor, SessionSummary, StartedSession, SupportAccessStats, TenantAccount,
};
use warden_domain::ImpersonationSession;

use super::types::{
    AccessTokenResponse, AuditLogEntryResponse, AuditLogPageResponse, EndedSessionResponse,
    IssuedAccessTokenResponse, OperatorSessionResponse, ScopeDescriptorResponse,
    SessionInfoResponse, SessionResponse, SupportAccessStatsResponse, TenantResponse,
};

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn optional_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(timestamp)
}

impl From<AccessTokenSummary> for AccessTokenResponse {
    fn from(value: AccessTokenSummary) -> Self {
        let token = value.token;
        Self {
            id: token.id.to_string(),
            scope: token.scope.to_strings(),
            status: value.status.as_str().to_owned(),
            expires_at: timestamp(token.expires_at),
            original_expires_at: timestamp(token.original_expires_at),
            created_at: timestamp(token.created_at),
            revoked_at: optional_timestamp(token.revoked_at),
            last_used_at: optional_timestamp(token.last_used_at),
            extensions_remaining: token.extensions_remaining(),
            last_extended_at: optional_timestamp(token.last_extended_at),
            token_prefix: token.token_prefix,
            created_by: token.created_by,
            revoked_by: token.revoked_by,
            revoke_reason: token.revoke_reason,
            use_count: token.use_count,
            max_uses: token.max_uses,
            extension_count: token.extension_count,
            operator_email: token.operator_email,
            operator_name: token.operator_name,
            purpose: token.purpose,
            notes: token.notes,
            total_sessions: value.total_sessions,
            active_sessions: value.active_sessions,
            total_actions: value.total_actions,
        }
    }
}

impl From<IssuedAccessToken> for IssuedAccessTokenResponse {
    fn from(value: IssuedAccessToken) -> Self {
        let token = value.token;
        Self {
            id: token.id.to_string(),
            token: value.raw_secret,
            scope: token.scope.to_strings(),
            expires_at: timestamp(token.expires_at),
            extensions_remaining: token.extensions_remaining(),
            created_at: timestamp(token.created_at),
            token_prefix: token.token_prefix,
            max_uses: token.max_uses,
            operator_email: token.operator_email,
            operator_name: token.operator_name,
            purpose: token.purpose,
        }
    }
}

impl From<SessionSummary> for SessionResponse {
    fn from(value: SessionSummary) -> Self {
        let session = value.session;
        Self {
            id: session.id.to_string(),
            token_id: session.token_id.to_string(),
            token_prefix: value.token_prefix,
            token_purpose: value.token_purpose,
            started_at: timestamp(session.started_at),
            ended_at: optional_timestamp(session.ended_at),
            end_reason: session.end_reason.map(|reason| reason.as_str().to_owned()),
            last_action_at: optional_timestamp(session.last_action_at),
            operator_name: session.operator_name,
            operator_email: session.operator_email,
            operator_identifier: session.operator_identifier,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            is_active: session.is_active,
            actions_count: session.actions_count,
        }
    }
}

impl From<ImpersonationSession> for EndedSessionResponse {
    fn from(value: ImpersonationSession) -> Self {
        Self {
            session_id: value.id.to_string(),
            ended_at: optional_timestamp(value.ended_at),
            end_reason: value.end_reason.map(|reason| reason.as_str().to_owned()),
        }
    }
}

impl From<AuditLogRecord> for AuditLogEntryResponse {
    fn from(value: AuditLogRecord) -> Self {
        let entry = value.entry;
        Self {
            id: entry.id.to_string(),
            session_id: entry.session_id.to_string(),
            token_id: entry.token_id.to_string(),
            action_type: entry.action_type.as_str().to_owned(),
            resource_type: entry.resource_type.as_str().to_owned(),
            created_at: timestamp(entry.created_at),
            resource_id: entry.resource_id,
            resource_name: entry.resource_name,
            action_details: entry.action_details,
            endpoint: entry.endpoint,
            http_method: entry.http_method,
            request_body_summary: entry.request_body_summary,
            response_status: entry.response_status,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            operator_name: value.operator_name,
            operator_email: value.operator_email,
            token_prefix: value.token_prefix,
            token_purpose: value.token_purpose,
        }
    }
}

impl From<AuditLogPage> for AuditLogPageResponse {
    fn from(value: AuditLogPage) -> Self {
        let has_more = value.has_more();
        Self {
            entries: value
                .entries
                .into_iter()
                .map(AuditLogEntryResponse::from)
                .collect(),
            total: value.total,
            limit: value.limit,
            offset: value.offset,
            has_more,
        }
    }
}

impl From<SupportAccessStats> for SupportAccessStatsResponse {
    fn from(value: SupportAccessStats) -> Self {
        Self {
            active_tokens: value.active_tokens,
            active_sessions: value.active_sessions,
            actions_last_30_days: value.actions_last_30_days,
            sessions_last_30_days: value.sessions_last_30_days,
        }
    }
}

impl From<TenantAccount> for TenantResponse {
    fn from(value: TenantAccount) -> Self {
        Self {
            id: value.tenant_id.to_string(),
            name: value.name,
            slug: value.slug,
        }
    }
}

impl From<StartedSession> for OperatorSessionResponse {
    fn from(value: StartedSession) -> Self {
        Self {
            session_token: value.raw_credential,
            session_id: value.session.id.to_string(),
            expires_at: timestamp(value.expires_at),
            scope: value.scope.to_strings(),
            tenant: TenantResponse::from(value.tenant),
            operator_name: value.session.operator_name,
            operator_identifier: value.session.operator_identifier,
        }
    }
}

impl From<ImpersonationContext> for SessionInfoResponse {
    fn from(value: ImpersonationContext) -> Self {
        let session = value.session;
        Self {
            session_id: session.id.to_string(),
            tenant: TenantResponse::from(value.tenant),
            scope: value.token.scope.to_strings(),
            started_at: timestamp(session.started_at),
            token_expires_at: timestamp(value.token.expires_at),
            operator_name: session.operator_name,
            operator_email: session.operator_email,
            operator_identifier: session.operator_identifier,
            actions_count: session.actions_count,
        }
    }
}

impl From<ScopeDescriptor> for ScopeDescriptorResponse {
    fn from(value: ScopeDescriptor) -> Self {
        Self {
            scope: value.scope.as_str().to_owned(),
            label: value.label.to_owned(),
            description: value.description.to_owned(),
        }
    }
}
