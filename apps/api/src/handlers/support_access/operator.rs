use super::*;

pub async fn authenticate_operator_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AuthenticateOperatorRequest>,
) -> ApiResult<Json<OperatorSessionResponse>> {
    let request = request_context(&headers);
    let started = state
        .operator_service
        .authenticate(
            OperatorAuthenticationInput {
                token: payload.token,
                operator_name: payload.operator_name,
                operator_email: payload.operator_email,
            },
            request.clone(),
        )
        .await?;

    spawn_audit_record(
        state.audit_service.clone(),
        started.session.clone(),
        AuditedAction::session_lifecycle(
            SupportActionType::SessionStart,
            started.session.id,
            request,
            state.clock.now(),
        ),
    );

    Ok(Json(OperatorSessionResponse::from(started)))
}

pub async fn session_info_handler(
    Extension(context): Extension<ImpersonationContext>,
) -> Json<SessionInfoResponse> {
    Json(SessionInfoResponse::from(context))
}

pub async fn end_own_session_handler(
    State(state): State<AppState>,
    Extension(context): Extension<ImpersonationContext>,
    headers: HeaderMap,
) -> ApiResult<Json<EndedSessionResponse>> {
    spawn_audit_record(
        state.audit_service.clone(),
        context.session.clone(),
        AuditedAction::session_lifecycle(
            SupportActionType::SessionEnd,
            context.session.id,
            request_context(&headers),
            state.clock.now(),
        ),
    );

    let session = state.operator_service.end_own_session(&context).await?;

    Ok(Json(EndedSessionResponse::from(session)))
}

pub async fn scope_catalog_handler(
    State(state): State<AppState>,
) -> Json<Vec<ScopeDescriptorResponse>> {
    Json(
        state
            .operator_service
            .scope_catalog()
            .into_iter()
            .map(ScopeDescriptorResponse::from)
            .collect(),
    )
}
