use std::sync::Arc;

use chrono::Duration;
use warden_core::AppResult;

use crate::Clock;
use crate::support_access_ports::ImpersonationSessionRepository;

/// Ends impersonation sessions that have gone idle.
#[derive(Clone)]
pub struct InactiveSessionSweeper {
    repository: Arc<dyn ImpersonationSessionRepository>,
    clock: Arc<dyn Clock>,
}

impl InactiveSessionSweeper {
    /// Creates a new sweeper.
    #[must_use]
    pub fn new(repository: Arc<dyn ImpersonationSessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Ends sessions whose last activity is older than `idle_threshold`,
    /// returning how many were ended.
    pub async fn sweep(&self, idle_threshold: Duration) -> AppResult<u64> {
        let now = self.clock.now();
        self.repository
            .end_inactive_sessions(now - idle_threshold, now)
            .await
    }
}
