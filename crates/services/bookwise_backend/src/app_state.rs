// --- File: crates/services/bookwise_backend/src/app_state.rs ---
use bookwise_common::services::ServiceFactory;
use bookwise_config::AppConfig;
use std::sync::Arc;

use crate::service_factory::BookwiseServiceFactory;

/// Application state shared across all routes: the loaded configuration and
/// the factory every service is obtained from.
#[derive(Clone)]
pub struct AppState {
    #[allow(dead_code)]
    pub config: Arc<AppConfig>,
    pub service_factory: Arc<dyn ServiceFactory>,
}

impl AppState {
    pub async fn new(config: Arc<AppConfig>) -> Self {
        let service_factory = Arc::new(BookwiseServiceFactory::new(config.clone()).await);
        Self {
            config,
            service_factory,
        }
    }
}
