use super::*;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTokensQuery {
    #[serde(default)]
    pub include_expired: bool,
}

pub async fn create_token_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateAccessTokenRequest>,
) -> ApiResult<(StatusCode, Json<IssuedAccessTokenResponse>)> {
    let issued = state
        .admin_service
        .create_token(
            &user,
            CreateAccessTokenInput {
                scope: payload.scope,
                duration_hours: payload.duration_hours,
                max_uses: payload.max_uses,
                operator_email: payload.operator_email,
                operator_name: payload.operator_name,
                purpose: payload.purpose,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssuedAccessTokenResponse::from(issued)),
    ))
}

pub async fn list_tokens_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<ListTokensQuery>,
) -> ApiResult<Json<Vec<AccessTokenResponse>>> {
    let tokens = state
        .admin_service
        .list_tokens(&user, query.include_expired)
        .await?
        .into_iter()
        .map(AccessTokenResponse::from)
        .collect();

    Ok(Json(tokens))
}

pub async fn get_token_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(token_id): Path<String>,
) -> ApiResult<Json<AccessTokenResponse>> {
    let token_id = parse_id(&token_id, "token id")?;
    let token = state.admin_service.get_token(&user, token_id).await?;

    Ok(Json(AccessTokenResponse::from(token)))
}

pub async fn extend_token_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(token_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<AccessTokenResponse>> {
    let token_id = parse_id(&token_id, "token id")?;
    let payload: ExtendAccessTokenRequest = optional_json(&body)?;
    let token = state
        .admin_service
        .extend_token(&user, token_id, payload.additional_hours)
        .await?;

    Ok(Json(AccessTokenResponse::from(token)))
}

pub async fn revoke_token_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(token_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<AccessTokenResponse>> {
    let token_id = parse_id(&token_id, "token id")?;
    let payload: RevokeAccessTokenRequest = optional_json(&body)?;
    let token = state
        .admin_service
        .revoke_token(&user, token_id, payload.reason)
        .await?;

    Ok(Json(AccessTokenResponse::from(token)))
}
