// --- File: crates/bookwise_mailer/src/service.rs ---
//! SMTP implementation of the [`NotificationService`] trait.

use bookwise_common::services::{BoxFuture, NotificationResult, NotificationService};
use bookwise_config::SmtpConfig;
use lettre::{
    message::{header, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when building or sending mail.
#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Async SMTP mailer over an implicit-TLS relay (e.g. port 465).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
}

impl SmtpMailer {
    /// Build the mailer from config. The password comes only from the
    /// `SMTP_PASSWORD` environment variable; without it the mailer is
    /// disabled (`Ok(None)`) and the caller keeps running without mail.
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, MailerError> {
        let Ok(password) = std::env::var("SMTP_PASSWORD") else {
            warn!("SMTP_PASSWORD not set, outgoing mail is disabled.");
            return Ok(None);
        };

        let from = Mailbox::new(config.from_name.clone(), config.from_address.parse()?);
        let reply_to = match &config.reply_to {
            Some(address) => Some(Mailbox::new(None, address.parse()?)),
            None => None,
        };
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), password))
            .build();

        Ok(Some(Self {
            transport,
            from,
            reply_to,
        }))
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> Result<Message, MailerError> {
        let to_mailbox: Mailbox = to.parse()?;
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }
        let message = match html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                text_body.to_string(),
                html.to_string(),
            ))?,
            None => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(text_body.to_string())?,
        };
        Ok(message)
    }
}

impl NotificationService for SmtpMailer {
    type Error = MailerError;

    fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let to = to.to_string();
        let subject = subject.to_string();
        let text_body = text_body.to_string();
        let html_body = html_body.map(str::to_string);

        Box::pin(async move {
            let message =
                self.build_message(&to, &subject, &text_body, html_body.as_deref())?;
            let response = self.transport.send(message).await?;
            Ok(NotificationResult {
                id: to,
                status: response.code().to_string(),
            })
        })
    }
}
