// --- File: crates/bookwise_common/src/features.rs ---
//! Feature flag handling.
//!
//! Features are gated twice: at compile time with `#[cfg(feature = "...")]`
//! and at runtime with the `use_*` flags in the configuration. A feature is
//! live only when its flag is set and its config section is present.

use bookwise_config::AppConfig;

/// Check if a feature is enabled at runtime based on configuration.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

/// Check if the Google Calendar feature is enabled at runtime.
pub fn is_gcal_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_gcal, config.gcal.as_ref())
}

/// Check if the SMTP mailer feature is enabled at runtime.
pub fn is_smtp_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_smtp, config.smtp.as_ref())
}
