pub mod budget;
pub mod cache;
pub mod clock;
pub mod dashboard;
pub mod permissions;
pub mod settings;

use std::sync::Arc;

use budget::CostSource;
use dashboard::Dashboard;
use permissions::{PermissionProvider, PermissionResolver};
use settings::AppSettings;

/// Everything the add-on keeps alive for the life of the process.
///
/// Built once at startup and handed to request handlers. There is no global
/// state; an admin action can call [`ModWatch::reset`] to drop cached rosters.
pub struct ModWatch {
    pub permissions: PermissionResolver,
    pub dashboard: Dashboard,
}

impl ModWatch {
    pub fn new(
        provider: Arc<dyn PermissionProvider>,
        cost_source: Arc<dyn CostSource>,
        settings: &AppSettings,
    ) -> Self {
        log::info!(
            "ModWatch: permission TTL {}s, failure backoff {}s",
            settings.permission_cache_ttl_secs,
            settings.permission_failure_backoff_secs
        );

        Self {
            permissions: PermissionResolver::new(provider, settings.resolver_config()),
            dashboard: Dashboard::with_condensed_limit(cost_source, settings.condensed_max_chars),
        }
    }

    pub async fn reset(&self) {
        self.permissions.reset().await;
    }
}
