// --- File: crates/bookwise_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! Trait definitions for the external services the application talks to
//! (the remote calendar and the outgoing mailer). Handlers and the service
//! factory depend on these traits rather than on concrete clients, which
//! keeps the HTTP surface testable against in-memory implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A trait for calendar service operations.
///
/// Covers what the booking flow needs from the remote calendar: busy-interval
/// lookup, event creation, deletion, cancellation, and listing.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: StdError + Send + Sync + 'static;

    /// Get busy time intervals within a specified time range.
    #[allow(clippy::type_complexity)]
    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error>;

    /// Create a calendar event. Implementations must re-check the interval
    /// against busy times immediately before writing and fail on overlap.
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error>;

    /// Delete a calendar event.
    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error>;

    /// Mark a calendar event as cancelled without removing it.
    fn mark_event_cancelled(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error>;

    /// Get booked events within a specified time range.
    #[allow(clippy::type_complexity)]
    fn get_booked_events(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        include_cancelled: bool,
    ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error>;
}

/// A trait for notification service operations.
pub trait NotificationService: Send + Sync {
    /// Error type returned by notification service operations.
    type Error: StdError + Send + Sync + 'static;

    /// Send an email. `text_body` is the plain-text part; when `html_body`
    /// is present the message is sent as multipart/alternative.
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

/// A factory for creating service instances.
///
/// The application asks the factory for services instead of constructing
/// them; a `None` means the feature is disabled or failed to initialize.
pub trait ServiceFactory: Send + Sync {
    /// Get a calendar service instance.
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>>;

    /// Get a notification service instance.
    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>>;
}

/// Adapter that erases a concrete service's error type into [`BoxedError`],
/// so implementations with their own thiserror enums can be stored behind
/// `Arc<dyn CalendarService<Error = BoxedError>>`.
pub struct Boxed<S>(pub Arc<S>);

impl<S> Boxed<S> {
    pub fn new(inner: S) -> Self {
        Boxed(Arc::new(inner))
    }
}

impl<S> CalendarService for Boxed<S>
where
    S: CalendarService + 'static,
{
    type Error = BoxedError;

    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error> {
        let inner = Arc::clone(&self.0);
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            inner
                .get_busy_times(&calendar_id, start_time, end_time)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let inner = Arc::clone(&self.0);
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            inner
                .create_event(&calendar_id, event)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error> {
        let inner = Arc::clone(&self.0);
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        Box::pin(async move {
            inner
                .delete_event(&calendar_id, &event_id, notify_attendees)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn mark_event_cancelled(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let inner = Arc::clone(&self.0);
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        Box::pin(async move {
            inner
                .mark_event_cancelled(&calendar_id, &event_id, notify_attendees)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn get_booked_events(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        include_cancelled: bool,
    ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error> {
        let inner = Arc::clone(&self.0);
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            inner
                .get_booked_events(&calendar_id, start_time, end_time, include_cancelled)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}

impl<S> NotificationService for Boxed<S>
where
    S: NotificationService + 'static,
{
    type Error = BoxedError;

    fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let inner = Arc::clone(&self.0);
        let to = to.to_string();
        let subject = subject.to_string();
        let text_body = text_body.to_string();
        let html_body = html_body.map(str::to_string);
        Box::pin(async move {
            inner
                .send_email(&to, &subject, &text_body, html_body.as_deref())
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}

/// Data structures for calendar service operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// The start time of the event, RFC 3339.
    pub start_time: String,
    /// The end time of the event, RFC 3339.
    pub end_time: String,
    /// The summary or title of the event.
    pub summary: String,
    /// An optional description of the event.
    pub description: Option<String>,
    /// Whether to attach a Google Meet conference to the event.
    #[serde(skip)]
    pub request_meet_link: bool,
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventResult {
    /// The ID of the event.
    pub event_id: Option<String>,
    /// The status of the event.
    pub status: String,
    /// The Meet link attached to the event, if one was created.
    pub meet_link: Option<String>,
    /// Link to the event in the calendar UI.
    pub html_link: Option<String>,
}

/// Represents a booked event.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedEvent {
    /// The ID of the event.
    pub event_id: String,
    /// The summary or title of the event.
    pub summary: String,
    /// An optional description of the event.
    pub description: Option<String>,
    /// The start time of the event.
    pub start_time: String,
    /// The end time of the event.
    pub end_time: String,
    /// The status of the event ("confirmed", "cancelled", ...).
    pub status: String,
    /// When the event was created.
    pub created: String,
    /// When the event was last updated.
    pub updated: String,
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// The ID of the notification.
    pub id: String,
    /// The status of the notification.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("fake mailer error")]
    struct FakeError;

    struct FakeMailer {
        fail: bool,
    }

    impl NotificationService for FakeMailer {
        type Error = FakeError;

        fn send_email(
            &self,
            to: &str,
            _subject: &str,
            _text_body: &str,
            _html_body: Option<&str>,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            let fail = self.fail;
            let id = format!("msg-{to}");
            Box::pin(async move {
                if fail {
                    Err(FakeError)
                } else {
                    Ok(NotificationResult {
                        id,
                        status: "sent".to_string(),
                    })
                }
            })
        }
    }

    #[tokio::test]
    async fn boxed_adapter_passes_results_through() {
        let mailer = Boxed::new(FakeMailer { fail: false });
        let result = mailer
            .send_email("client@example.com", "hi", "body", None)
            .await
            .unwrap();
        assert_eq!(result.id, "msg-client@example.com");
        assert_eq!(result.status, "sent");
    }

    #[tokio::test]
    async fn boxed_adapter_erases_error_type() {
        let mailer = Boxed::new(FakeMailer { fail: true });
        let err = mailer
            .send_email("client@example.com", "hi", "body", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fake mailer error");
    }
}
