use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{any, delete, get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use warden_core::AppError;

use crate::state::AppState;
use crate::{handlers, impersonation, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(routes(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}

/// Route table without the session and transport layers.
pub(crate) fn routes(app_state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route(
            "/api/support-access/tokens",
            get(handlers::support_access::list_tokens_handler)
                .post(handlers::support_access::create_token_handler),
        )
        .route(
            "/api/support-access/tokens/{token_id}",
            get(handlers::support_access::get_token_handler)
                .delete(handlers::support_access::revoke_token_handler),
        )
        .route(
            "/api/support-access/tokens/{token_id}/extend",
            post(handlers::support_access::extend_token_handler),
        )
        .route(
            "/api/support-access/sessions",
            get(handlers::support_access::list_sessions_handler),
        )
        .route(
            "/api/support-access/sessions/{session_id}",
            delete(handlers::support_access::end_session_handler),
        )
        .route(
            "/api/support-access/audit",
            get(handlers::support_access::list_audit_log_handler),
        )
        .route(
            "/api/support-access/stats",
            get(handlers::support_access::support_access_stats_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_tenant_user,
        ));

    let support_session_routes = Router::new()
        .route(
            "/api/support-access/session/info",
            get(handlers::support_access::session_info_handler),
        )
        .route(
            "/api/support-access/session/end",
            post(handlers::support_access::end_own_session_handler),
        )
        .route(
            "/api/impersonation/{*path}",
            any(impersonation::impersonation_proxy_handler),
        )
        .route_layer(from_fn_with_state(
            app_state,
            middleware::require_support_session,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/support-access/authenticate",
            post(handlers::support_access::authenticate_operator_handler),
        )
        .route(
            "/api/support-access/scopes",
            get(handlers::support_access::scope_catalog_handler),
        )
        .merge(admin_routes)
        .merge(support_session_routes)
}
