// --- File: crates/services/bookwise_backend/src/service_factory.rs ---
//! Service factory implementation.
//!
//! Builds the external services the application needs, based on compile-time
//! features and the runtime `use_*` flags. A service that is disabled or
//! fails to initialize is exposed as `None`; callers decide how to degrade.

use bookwise_config::AppConfig;
use std::sync::Arc;

use bookwise_common::services::{
    BoxedError, CalendarService, NotificationService, ServiceFactory,
};
#[allow(unused_imports)] // used only with certain feature sets
use {
    bookwise_common::features::{is_gcal_enabled, is_smtp_enabled},
    bookwise_common::services::Boxed,
    tracing::{error, info, warn},
};

#[cfg(feature = "gcal")]
use bookwise_gcal::{auth::create_calendar_hub, service::GoogleCalendarService};

#[cfg(feature = "smtp")]
use bookwise_mailer::SmtpMailer;

/// Service factory for the backend binary.
pub struct BookwiseServiceFactory {
    #[allow(dead_code)]
    config: Arc<AppConfig>,
    #[cfg(feature = "gcal")]
    calendar_service: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    #[cfg(feature = "smtp")]
    notification_service: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
}

impl BookwiseServiceFactory {
    /// Create a new service factory, initializing every enabled service.
    pub async fn new(config: Arc<AppConfig>) -> Self {
        #[cfg(feature = "gcal")]
        let calendar_service = if is_gcal_enabled(&config) {
            info!("Initializing Google Calendar service...");
            match create_calendar_hub(config.gcal.as_ref().unwrap()).await {
                Ok(hub) => {
                    let service = GoogleCalendarService::new(Arc::new(hub));
                    let boxed: Arc<dyn CalendarService<Error = BoxedError>> =
                        Arc::new(Boxed::new(service));
                    Some(boxed)
                }
                Err(e) => {
                    error!("Failed to initialize Google Calendar service: {}", e);
                    None
                }
            }
        } else {
            warn!("Google Calendar feature is disabled by configuration.");
            None
        };

        #[cfg(feature = "smtp")]
        let notification_service = if is_smtp_enabled(&config) {
            match SmtpMailer::from_config(config.smtp.as_ref().unwrap()) {
                Ok(Some(mailer)) => {
                    info!("SMTP mailer initialized.");
                    let boxed: Arc<dyn NotificationService<Error = BoxedError>> =
                        Arc::new(Boxed::new(mailer));
                    Some(boxed)
                }
                Ok(None) => None, // no password, already logged
                Err(e) => {
                    error!("Failed to initialize SMTP mailer: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            #[cfg(feature = "gcal")]
            calendar_service,
            #[cfg(feature = "smtp")]
            notification_service,
        }
    }
}

impl ServiceFactory for BookwiseServiceFactory {
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>> {
        #[cfg(feature = "gcal")]
        {
            self.calendar_service.clone()
        }
        #[cfg(not(feature = "gcal"))]
        {
            None
        }
    }

    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>> {
        #[cfg(feature = "smtp")]
        {
            self.notification_service.clone()
        }
        #[cfg(not(feature = "smtp"))]
        {
            None
        }
    }
}
