use super::*;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub session_id: Option<String>,
    pub token_id: Option<String>,
    pub action_type: Option<String>,
    pub resource_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl AuditLogQuery {
    fn into_filter(self) -> Result<warden_application::AuditLogQuery, AppError> {
        Ok(warden_application::AuditLogQuery {
            session_id: self
                .session_id
                .as_deref()
                .map(|value| parse_id(value, "session id"))
                .transpose()?,
            token_id: self
                .token_id
                .as_deref()
                .map(|value| parse_id(value, "token id"))
                .transpose()?,
            action_type: self
                .action_type
                .as_deref()
                .map(SupportActionType::from_str)
                .transpose()?,
            resource_type: self
                .resource_type
                .as_deref()
                .map(warden_domain::ResourceType::from_str)
                .transpose()?,
            start_date: self
                .start_date
                .as_deref()
                .map(|value| parse_timestamp(value, "start date"))
                .transpose()?,
            end_date: self
                .end_date
                .as_deref()
                .map(|value| parse_timestamp(value, "end date"))
                .transpose()?,
            limit: self
                .limit
                .unwrap_or(warden_application::AuditLogQuery::DEFAULT_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<AuditLogPageResponse>> {
    let page = state
        .admin_service
        .list_audit_log(&user, query.into_filter()?)
        .await?;

    Ok(Json(AuditLogPageResponse::from(page)))
}

pub async fn support_access_stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<SupportAccessStatsResponse>> {
    let stats = state.admin_service.stats(&user).await?;

    Ok(Json(SupportAccessStatsResponse::from(stats)))
}
