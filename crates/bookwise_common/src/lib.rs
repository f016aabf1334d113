// --- File: crates/bookwise_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Shared error type
pub mod features; // Feature flag handling
pub mod logging; // Logging utilities
pub mod services; // Service abstractions

// Re-export error types for easier access
pub use error::BookwiseError;

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_result};

// Re-export feature flag handling utilities for easier access
pub use features::{is_feature_enabled, is_gcal_enabled, is_smtp_enabled};
