// --- File: crates/bookwise_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Google Calendar Config ---
// Holds the non-secret calendar settings. The service-account key lives on
// disk at `key_path`; the target calendar must be shared with the service
// account's client_email (edit access).
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GcalConfig {
    pub key_path: Option<String>,
    pub calendar_id: Option<String>,
}

// --- Booking Schedule Config ---
// Everything the slot engine needs to describe the bookable week. All fields
// are optional; the engine substitutes its defaults for missing or
// unparseable values.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BookingConfig {
    /// IANA time zone the schedule is defined in (default "Asia/Jerusalem").
    pub time_zone: Option<String>,
    /// Start of the working day, "HH:MM" (default "09:00").
    pub work_start_time: Option<String>,
    /// End of the working day, "HH:MM" (default "18:00").
    pub work_end_time: Option<String>,
    /// Bookable weekdays as "Sun".."Sat" (default Sun-Thu).
    pub working_days: Option<Vec<String>>,
    /// Slot length in minutes (default 60).
    pub slot_duration_minutes: Option<i64>,
    /// Minimum notice before a slot may start, in minutes (default 60).
    pub min_notice_minutes: Option<i64>,
    /// Upper bound on the `days` query parameter (default 60).
    pub max_scan_days: Option<i64>,
    /// Prefix for created event summaries (default "Consultation").
    pub event_summary_prefix: Option<String>,
}

// --- SMTP Config ---
// Non-secret mail settings. The password is read only from the
// SMTP_PASSWORD environment variable, never from a config file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub from_address: String,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_gcal: bool,
    #[serde(default)]
    pub use_smtp: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub booking: Option<BookingConfig>,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}
