// --- File: crates/bookwise_config/src/lib.rs ---
//! Configuration loading for the Bookwise services.
//!
//! Sources are layered, later entries winning:
//! 1. built-in defaults,
//! 2. an optional config file (`BOOKWISE_CONFIG`, default `config/default`),
//! 3. environment variables prefixed `BOOKWISE` with `__` as the section
//!    separator (e.g. `BOOKWISE_SERVER__PORT=8080`).

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;

pub mod models;
pub use models::{AppConfig, BookingConfig, GcalConfig, ServerConfig, SmtpConfig};

static DOTENV: OnceCell<()> = OnceCell::new();

/// Load `.env` into the process environment exactly once. Safe to call from
/// any thread; a missing file is not an error.
pub fn ensure_dotenv_loaded() {
    DOTENV.get_or_init(|| {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }
    });
}

/// Load the application configuration from defaults, file, and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config_path =
        std::env::var("BOOKWISE_CONFIG").unwrap_or_else(|_| "config/default".to_string());

    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8086)?
        .add_source(File::with_name(&config_path).required(false))
        .add_source(Environment::with_prefix("BOOKWISE").separator("__"))
        .build()?
        .try_deserialize()
}
