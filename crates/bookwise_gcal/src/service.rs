// --- File: crates/bookwise_gcal/src/service.rs ---
//! Google Calendar implementation of the [`CalendarService`] trait.

use std::sync::Arc;

use bookwise_common::services::{
    BookedEvent, BoxFuture, CalendarEvent, CalendarEventResult, CalendarService,
};
use chrono::{DateTime, Utc};
use google_calendar3::api::{
    ConferenceData, ConferenceSolutionKey, CreateConferenceRequest, Event, EventDateTime,
    EventReminder, EventReminders, FreeBusyRequest, FreeBusyRequestItem,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::HubType;

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("Booking conflict")]
    Conflict,
    #[error("Event not found: {0}")]
    NotFound(String),
    #[error("Calendar not configured: {0}")]
    NotConfigured(String),
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

/// Extract the Meet link from a created/fetched event, preferring the
/// conference entry points over the legacy hangout link.
fn meet_link_of(event: &Event) -> Option<String> {
    if let Some(conference) = &event.conference_data {
        if let Some(entry_points) = &conference.entry_points {
            for entry in entry_points {
                if let Some(uri) = &entry.uri {
                    return Some(uri.clone());
                }
            }
        }
    }
    event.hangout_link.clone()
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalServiceError;

    /// Busy intervals for `calendar_id` between `start_time` and `end_time`,
    /// via the freebusy query, sorted by start. Periods with a missing bound
    /// are skipped with a warning.
    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let req = FreeBusyRequest {
                time_min: Some(start_time),
                time_max: Some(end_time),
                time_zone: Some("UTC".to_string()),
                items: Some(vec![FreeBusyRequestItem {
                    id: Some(calendar_id.to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            };

            let (_response, freebusy_response) = calendar_hub.freebusy().query(req).doit().await?;

            let mut busy_periods = Vec::new();
            if let Some(calendars) = freebusy_response.calendars {
                if let Some(cal_info) = calendars.get(&calendar_id) {
                    if let Some(busy_times) = &cal_info.busy {
                        for period in busy_times {
                            if let (Some(start_dt), Some(end_dt)) = (period.start, period.end) {
                                busy_periods.push((start_dt, end_dt));
                            } else {
                                warn!(
                                    "Skipping busy period with missing start/end: {:?}",
                                    period
                                );
                            }
                        }
                    }
                }
            }
            busy_periods.sort_by_key(|k| k.0);
            Ok(busy_periods)
        })
    }

    /// Create the event. The interval is re-checked against busy times
    /// immediately before the insert; an overlap returns `Conflict` and
    /// nothing is written. When `request_meet_link` is set a Meet
    /// conference is attached. Attendees are never set: service accounts on
    /// consumer calendars cannot invite, the client is notified by mail.
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();
        let this = self;

        Box::pin(async move {
            let start_dt = DateTime::parse_from_rfc3339(&event.start_time)
                .map_err(|e| GcalServiceError::TimeParseError(format!("Invalid start_time: {}", e)))?
                .with_timezone(&Utc);
            let end_dt = DateTime::parse_from_rfc3339(&event.end_time)
                .map_err(|e| GcalServiceError::TimeParseError(format!("Invalid end_time: {}", e)))?
                .with_timezone(&Utc);

            if end_dt <= start_dt {
                return Err(GcalServiceError::TimeParseError(
                    "End time must be after start time".to_string(),
                ));
            }

            // Re-verification before commit
            let busy_times = this.get_busy_times(&calendar_id, start_dt, end_dt).await?;
            for (busy_start, busy_end) in &busy_times {
                if start_dt < *busy_end && end_dt > *busy_start {
                    return Err(GcalServiceError::Conflict);
                }
            }

            let conference_data = event.request_meet_link.then(|| ConferenceData {
                create_request: Some(CreateConferenceRequest {
                    request_id: Some(format!("booking-{}", Uuid::new_v4())),
                    conference_solution_key: Some(ConferenceSolutionKey {
                        type_: Some("hangoutsMeet".to_string()),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            });

            let new_event = Event {
                summary: Some(event.summary),
                description: event.description,
                start: Some(EventDateTime {
                    date_time: Some(start_dt),
                    time_zone: Some("UTC".to_string()),
                    ..Default::default()
                }),
                end: Some(EventDateTime {
                    date_time: Some(end_dt),
                    time_zone: Some("UTC".to_string()),
                    ..Default::default()
                }),
                conference_data,
                reminders: Some(EventReminders {
                    use_default: Some(false),
                    overrides: Some(vec![EventReminder {
                        method: Some("popup".to_string()),
                        minutes: Some(15),
                    }]),
                }),
                ..Default::default()
            };

            let (_response, created_event) = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .conference_data_version(1)
                .doit()
                .await?;

            info!("Created calendar event {:?}", created_event.id);

            Ok(CalendarEventResult {
                event_id: created_event.id.clone(),
                status: created_event
                    .status
                    .clone()
                    .unwrap_or_else(|| "confirmed".to_string()),
                meet_link: meet_link_of(&created_event),
                html_link: created_event.html_link.clone(),
            })
        })
    }

    /// Delete an event. A 404 counts as success. Cancelled events (and
    /// 403/400 responses) go through a restore-then-delete fallback, since
    /// the API refuses to delete an event that is already cancelled.
    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let get_result = calendar_hub.events().get(&calendar_id, &event_id).doit().await;

            let event = match get_result {
                Ok((_response, event)) => event,
                Err(e) => {
                    if e.to_string().contains("404") {
                        return Ok(());
                    }
                    return Err(GcalServiceError::ApiError(e));
                }
            };
            let status = event.status.as_deref().unwrap_or("confirmed");

            let delete_result = calendar_hub
                .events()
                .delete(&calendar_id, &event_id)
                .send_updates(if notify_attendees { "all" } else { "none" })
                .doit()
                .await;

            match delete_result {
                Ok(_) => Ok(()),
                Err(e) => {
                    if status == "cancelled"
                        || e.to_string().contains("403")
                        || e.to_string().contains("400")
                    {
                        let sequence = event.sequence.map(|n| n + 1).unwrap_or(1);
                        let restored_event = Event {
                            status: Some("confirmed".to_string()),
                            sequence: Some(sequence),
                            ..Default::default()
                        };

                        let restore_result = calendar_hub
                            .events()
                            .patch(restored_event, &calendar_id, &event_id)
                            .send_updates("none") // intermediate step, no mail
                            .doit()
                            .await;

                        match restore_result {
                            Ok(_) => {
                                calendar_hub
                                    .events()
                                    .delete(&calendar_id, &event_id)
                                    .send_updates(if notify_attendees { "all" } else { "none" })
                                    .doit()
                                    .await?;
                                Ok(())
                            }
                            Err(_) => {
                                warn!(
                                    "Could not fully delete event {}, attempted restore and delete",
                                    event_id
                                );
                                Ok(())
                            }
                        }
                    } else {
                        Err(GcalServiceError::ApiError(e))
                    }
                }
            }
        })
    }

    /// Mark an event cancelled without deleting it, bumping the sequence
    /// number so the change propagates to synced calendars.
    fn mark_event_cancelled(
        &self,
        calendar_id: &str,
        event_id: &str,
        notify_attendees: bool,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let get_result = calendar_hub.events().get(&calendar_id, &event_id).doit().await;
            let event = match get_result {
                Ok((_response, event)) => event,
                Err(e) => {
                    if e.to_string().contains("404") {
                        return Err(GcalServiceError::NotFound(event_id));
                    }
                    return Err(GcalServiceError::ApiError(e));
                }
            };

            let sequence = event.sequence.map(|n| n + 1).unwrap_or(1);
            let cancelled_event = Event {
                status: Some("cancelled".to_string()),
                sequence: Some(sequence),
                ..Default::default()
            };

            let (_response, updated) = calendar_hub
                .events()
                .patch(cancelled_event, &calendar_id, &event_id)
                .send_updates(if notify_attendees { "all" } else { "none" })
                .doit()
                .await?;

            Ok(CalendarEventResult {
                event_id: updated.id.clone(),
                status: updated.status.unwrap_or_else(|| "cancelled".to_string()),
                meet_link: None,
                html_link: updated.html_link,
            })
        })
    }

    /// List events in the range, recurring events expanded, ordered by start
    /// time. Date-only events get day bounds so callers always see RFC 3339.
    fn get_booked_events(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        include_cancelled: bool,
    ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let request = calendar_hub
                .events()
                .list(&calendar_id)
                .time_min(start_time)
                .time_max(end_time)
                .single_events(true)
                .order_by("startTime")
                .show_deleted(include_cancelled);

            let (_, events_list) = request.doit().await?;

            let mut booked_events = Vec::new();
            if let Some(items) = events_list.items {
                for event in items {
                    let status = event.status.as_deref().unwrap_or("confirmed");
                    if !include_cancelled && status == "cancelled" {
                        continue;
                    }

                    let start_time = match &event.start {
                        Some(start) => match start.date_time {
                            Some(dt) => dt.to_rfc3339(),
                            None => match start.date {
                                Some(d) => format!("{}T00:00:00Z", d),
                                None => "Unknown start time".to_string(),
                            },
                        },
                        None => "Unknown start time".to_string(),
                    };
                    let end_time = match &event.end {
                        Some(end) => match end.date_time {
                            Some(dt) => dt.to_rfc3339(),
                            None => match end.date {
                                Some(d) => format!("{}T23:59:59Z", d),
                                None => "Unknown end time".to_string(),
                            },
                        },
                        None => "Unknown end time".to_string(),
                    };

                    booked_events.push(BookedEvent {
                        event_id: event.id.unwrap_or_default(),
                        summary: event.summary.unwrap_or_default(),
                        description: event.description,
                        start_time,
                        end_time,
                        status: event.status.unwrap_or_else(|| "confirmed".to_string()),
                        created: event.created.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
                        updated: event.updated.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
                    });
                }
            }

            Ok(booked_events)
        })
    }
}

/// Stand-in used when no calendar credential is configured. Every call
/// fails with `NotConfigured`, which the availability handler turns into
/// the empty-slots-plus-warning response, so the public surface stays up
/// while the admin sorts out credentials.
pub struct UnavailableCalendarService;

impl UnavailableCalendarService {
    fn err() -> GcalServiceError {
        GcalServiceError::NotConfigured("no service-account key or calendar id".to_string())
    }
}

impl CalendarService for UnavailableCalendarService {
    type Error = GcalServiceError;

    fn get_busy_times(
        &self,
        _calendar_id: &str,
        _start_time: DateTime<Utc>,
        _end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error> {
        Box::pin(async { Err(Self::err()) })
    }

    fn create_event(
        &self,
        _calendar_id: &str,
        _event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        Box::pin(async { Err(Self::err()) })
    }

    fn delete_event(
        &self,
        _calendar_id: &str,
        _event_id: &str,
        _notify_attendees: bool,
    ) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async { Err(Self::err()) })
    }

    fn mark_event_cancelled(
        &self,
        _calendar_id: &str,
        _event_id: &str,
        _notify_attendees: bool,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        Box::pin(async { Err(Self::err()) })
    }

    fn get_booked_events(
        &self,
        _calendar_id: &str,
        _start_time: DateTime<Utc>,
        _end_time: DateTime<Utc>,
        _include_cancelled: bool,
    ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error> {
        Box::pin(async { Err(Self::err()) })
    }
}

/// In-memory implementation of CalendarService for tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock calendar: events held in a map keyed by calendar id. Busy times
    /// are derived from non-cancelled stored events. `failing` makes every
    /// call error, to exercise the degraded paths.
    pub struct MockCalendarService {
        events: Mutex<HashMap<String, Vec<(String, CalendarEvent, String)>>>,
        failing: bool,
    }

    impl MockCalendarService {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(HashMap::new()),
                failing: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                events: Mutex::new(HashMap::new()),
                failing: true,
            }
        }

        /// Seed an event directly, bypassing the conflict check.
        pub fn seed_event(&self, calendar_id: &str, event: CalendarEvent) -> String {
            let event_id = format!("mock-event-{}", Uuid::new_v4());
            let mut events = self.events.lock().unwrap();
            events
                .entry(calendar_id.to_string())
                .or_default()
                .push((event_id.clone(), event, "confirmed".to_string()));
            event_id
        }

        fn unavailable() -> GcalServiceError {
            GcalServiceError::TimeParseError("mock calendar unavailable".to_string())
        }
    }

    impl CalendarService for MockCalendarService {
        type Error = GcalServiceError;

        fn get_busy_times(
            &self,
            calendar_id: &str,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
        ) -> BoxFuture<'_, Vec<(DateTime<Utc>, DateTime<Utc>)>, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                if self.failing {
                    return Err(Self::unavailable());
                }
                let events = self.events.lock().unwrap();
                let calendar_events = events.get(&calendar_id).cloned().unwrap_or_default();

                let mut busy_times = Vec::new();
                for (_, event, status) in calendar_events {
                    if status == "cancelled" {
                        continue;
                    }
                    let event_start = DateTime::parse_from_rfc3339(&event.start_time)
                        .map_err(|e| GcalServiceError::TimeParseError(e.to_string()))?
                        .with_timezone(&Utc);
                    let event_end = DateTime::parse_from_rfc3339(&event.end_time)
                        .map_err(|e| GcalServiceError::TimeParseError(e.to_string()))?
                        .with_timezone(&Utc);
                    if event_start < end_time && event_end > start_time {
                        busy_times.push((event_start, event_end));
                    }
                }
                busy_times.sort_by_key(|k| k.0);
                Ok(busy_times)
            })
        }

        fn create_event(
            &self,
            calendar_id: &str,
            event: CalendarEvent,
        ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                if self.failing {
                    return Err(Self::unavailable());
                }
                let start_dt = DateTime::parse_from_rfc3339(&event.start_time)
                    .map_err(|e| {
                        GcalServiceError::TimeParseError(format!("Invalid start_time: {}", e))
                    })?
                    .with_timezone(&Utc);
                let end_dt = DateTime::parse_from_rfc3339(&event.end_time)
                    .map_err(|e| {
                        GcalServiceError::TimeParseError(format!("Invalid end_time: {}", e))
                    })?
                    .with_timezone(&Utc);

                let busy_times = self.get_busy_times(&calendar_id, start_dt, end_dt).await?;
                for (busy_start, busy_end) in &busy_times {
                    if start_dt < *busy_end && end_dt > *busy_start {
                        return Err(GcalServiceError::Conflict);
                    }
                }

                let event_id = format!("mock-event-{}", Uuid::new_v4());
                let meet_link = event
                    .request_meet_link
                    .then(|| format!("https://meet.example.com/{}", event_id));

                let mut events = self.events.lock().unwrap();
                events
                    .entry(calendar_id.to_string())
                    .or_default()
                    .push((event_id.clone(), event, "confirmed".to_string()));

                Ok(CalendarEventResult {
                    event_id: Some(event_id.clone()),
                    status: "confirmed".to_string(),
                    meet_link,
                    html_link: Some(format!("https://calendar.example.com/event/{}", event_id)),
                })
            })
        }

        fn delete_event(
            &self,
            calendar_id: &str,
            event_id: &str,
            _notify_attendees: bool,
        ) -> BoxFuture<'_, (), Self::Error> {
            let calendar_id = calendar_id.to_string();
            let event_id = event_id.to_string();

            Box::pin(async move {
                if self.failing {
                    return Err(Self::unavailable());
                }
                let mut events = self.events.lock().unwrap();
                if let Some(calendar_events) = events.get_mut(&calendar_id) {
                    calendar_events.retain(|(id, _, _)| id != &event_id);
                }
                Ok(())
            })
        }

        fn mark_event_cancelled(
            &self,
            calendar_id: &str,
            event_id: &str,
            _notify_attendees: bool,
        ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
            let calendar_id = calendar_id.to_string();
            let event_id = event_id.to_string();

            Box::pin(async move {
                if self.failing {
                    return Err(Self::unavailable());
                }
                let mut events = self.events.lock().unwrap();
                if let Some(calendar_events) = events.get_mut(&calendar_id) {
                    for (id, _, status) in calendar_events.iter_mut() {
                        if id == &event_id {
                            *status = "cancelled".to_string();
                            return Ok(CalendarEventResult {
                                event_id: Some(id.clone()),
                                status: "cancelled".to_string(),
                                meet_link: None,
                                html_link: None,
                            });
                        }
                    }
                }
                Err(GcalServiceError::NotFound(event_id))
            })
        }

        fn get_booked_events(
            &self,
            calendar_id: &str,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
            include_cancelled: bool,
        ) -> BoxFuture<'_, Vec<BookedEvent>, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                if self.failing {
                    return Err(Self::unavailable());
                }
                let events = self.events.lock().unwrap();
                let calendar_events = events.get(&calendar_id).cloned().unwrap_or_default();

                let mut booked_events = Vec::new();
                for (event_id, event, status) in calendar_events {
                    if !include_cancelled && status == "cancelled" {
                        continue;
                    }
                    let event_start = DateTime::parse_from_rfc3339(&event.start_time)
                        .map_err(|e| GcalServiceError::TimeParseError(e.to_string()))?
                        .with_timezone(&Utc);
                    let event_end = DateTime::parse_from_rfc3339(&event.end_time)
                        .map_err(|e| GcalServiceError::TimeParseError(e.to_string()))?
                        .with_timezone(&Utc);
                    if event_start < end_time && event_end > start_time {
                        booked_events.push(BookedEvent {
                            event_id,
                            summary: event.summary,
                            description: event.description,
                            start_time: event.start_time,
                            end_time: event.end_time,
                            status,
                            created: Utc::now().to_rfc3339(),
                            updated: Utc::now().to_rfc3339(),
                        });
                    }
                }
                booked_events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
                Ok(booked_events)
            })
        }
    }
}
