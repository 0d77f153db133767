use super::*;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsQuery {
    #[serde(default)]
    pub active_only: bool,
}

pub async fn list_sessions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state
        .admin_service
        .list_sessions(&user, query.active_only)
        .await?
        .into_iter()
        .map(SessionResponse::from)
        .collect();

    Ok(Json(sessions))
}

pub async fn end_session_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<EndedSessionResponse>> {
    let session_id = parse_id(&session_id, "session id")?;
    let session = state.admin_service.end_session(&user, session_id).await?;

    Ok(Json(EndedSessionResponse::from(session)))
}
