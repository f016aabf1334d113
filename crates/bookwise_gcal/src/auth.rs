// --- File: crates/bookwise_gcal/src/auth.rs ---
use bookwise_common::BookwiseError;
use bookwise_config::GcalConfig;
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use std::path::Path;

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

/// Build an authenticated calendar client from the service-account key at
/// `key_path`. The target calendar must be shared with the service account's
/// client_email (edit access), or every call will come back 404/403.
pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, BookwiseError> {
    let key_path = config
        .key_path
        .as_deref()
        .ok_or_else(|| BookwiseError::ConfigError("missing gcal.key_path".to_string()))?;

    let sa_key = read_service_account_key(Path::new(key_path))
        .await
        .map_err(|e| {
            BookwiseError::external("gcal", format!("reading service account key: {e}"))
        })?;

    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| BookwiseError::external("gcal", format!("building authenticator: {e}")))?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| BookwiseError::external("gcal", format!("loading TLS roots: {e}")))?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    let hub = CalendarHub::new(client, auth);

    Ok(hub)
}
