use std::sync::Arc;

use warden_application::{
    Clock, OperatorAccessService, SupportAccessAdminService, SupportAccessGateway,
    SupportAuditService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub admin_service: SupportAccessAdminService,
    pub operator_service: OperatorAccessService,
    pub gateway: SupportAccessGateway,
    pub audit_service: SupportAuditService,
    pub clock: Arc<dyn Clock>,
}
