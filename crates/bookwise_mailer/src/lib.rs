// --- File: crates/bookwise_mailer/src/lib.rs ---
// Declare modules within this crate
pub mod service;

pub use service::{MailerError, SmtpMailer};
