// File: crates/bookwise_gcal/src/handlers.rs
use crate::confirmation;
use crate::logic::{
    free_slots, overlaps, AvailabilityQuery, AvailableSlotsResponse, BookSlotRequest,
    BookedEventsQuery, BookedEventsResponse, BookingResponse, CancelBookingRequest,
    CancellationResponse, SchedulePolicy, Slot, SlotError, VersionResponse,
};
use crate::service::GcalServiceError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use bookwise_common::services::{
    BoxedError, CalendarEvent, CalendarService, NotificationService,
};
use bookwise_config::AppConfig;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared state for the booking routes. Handlers talk to the calendar and
/// the mailer through the service traits, never through concrete clients.
#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub policy: SchedulePolicy,
    pub calendar: Arc<dyn CalendarService<Error = BoxedError>>,
    pub mailer: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
}

impl BookingState {
    pub fn new(
        config: Arc<AppConfig>,
        calendar: Arc<dyn CalendarService<Error = BoxedError>>,
        mailer: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
    ) -> Self {
        let policy = SchedulePolicy::from_config(config.booking.as_ref());
        Self {
            config,
            policy,
            calendar,
            mailer,
        }
    }

    fn calendar_id(&self) -> Option<String> {
        self.config
            .gcal
            .as_ref()
            .and_then(|g| g.calendar_id.clone())
    }

    /// Sender identity for the confirmation mail: display name and the
    /// address a client can reply to.
    fn sender_identity(&self) -> (String, String) {
        match self.config.smtp.as_ref() {
            Some(smtp) => (
                smtp.from_name.clone().unwrap_or_else(|| "Bookwise".to_string()),
                smtp.reply_to.clone().unwrap_or_else(|| smtp.from_address.clone()),
            ),
            None => ("Bookwise".to_string(), String::new()),
        }
    }
}

fn service_error(err: &BoxedError) -> Option<&GcalServiceError> {
    err.0.downcast_ref::<GcalServiceError>()
}

const CALENDAR_WARNING: &str = "Booking calendar is not available right now.";

/// Handler to get available time slots.
///
/// When the calendar cannot be consulted this returns 200 with an empty
/// list and a warning instead of an error, so the public site degrades
/// gracefully.
#[axum::debug_handler]
pub async fn get_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailableSlotsResponse>, (StatusCode, String)> {
    let policy = &state.policy;

    let days = query.days.unwrap_or(14);
    if days < 1 || days > policy.max_scan_days {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("days must be between 1 and {}", policy.max_scan_days),
        ));
    }
    if let Some(requested) = query.duration_minutes {
        if requested != policy.slot_minutes() {
            debug!(
                "requested duration {} ignored, slots are {} minutes",
                requested,
                policy.slot_minutes()
            );
        }
    }
    let display_tz = query
        .tz
        .as_deref()
        .and_then(|raw| Tz::from_str(raw).ok())
        .unwrap_or(policy.tz);

    let now = Utc::now();
    let window_start = policy.earliest_bookable(now);
    let window_end = window_start + Duration::days(days);

    let candidates = policy.candidate_slots(window_start, window_end);
    if candidates.is_empty() {
        return Ok(Json(AvailableSlotsResponse {
            slots: vec![],
            warning: None,
        }));
    }

    let Some(calendar_id) = state.calendar_id() else {
        warn!("Booking calendar not configured, returning empty slots.");
        return Ok(Json(AvailableSlotsResponse {
            slots: vec![],
            warning: Some(CALENDAR_WARNING.to_string()),
        }));
    };

    let busy = match state
        .calendar
        .get_busy_times(
            &calendar_id,
            window_start.with_timezone(&Utc),
            window_end.with_timezone(&Utc),
        )
        .await
    {
        Ok(busy) => busy,
        Err(e) => {
            warn!("freebusy lookup failed ({}), returning empty slots.", e);
            return Ok(Json(AvailableSlotsResponse {
                slots: vec![],
                warning: Some(CALENDAR_WARNING.to_string()),
            }));
        }
    };

    let slots = free_slots(&candidates, &busy)
        .into_iter()
        .map(|(start, end)| Slot {
            start: start.with_timezone(&display_tz).to_rfc3339(),
            end: end.with_timezone(&display_tz).to_rfc3339(),
        })
        .collect();

    Ok(Json(AvailableSlotsResponse {
        slots,
        warning: None,
    }))
}

/// Handler to book a time slot.
///
/// The policy gate runs before any calendar I/O, then the interval is
/// re-verified against live busy times just before the event is written.
#[axum::debug_handler]
pub async fn book_slot_handler(
    State(state): State<Arc<BookingState>>,
    Json(payload): Json<BookSlotRequest>,
) -> Result<Json<BookingResponse>, (StatusCode, String)> {
    let start = DateTime::parse_from_rfc3339(&payload.start)
        .map_err(|_| {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "start must be an RFC 3339 datetime".to_string(),
            )
        })?
        .with_timezone(&Utc);
    let end = DateTime::parse_from_rfc3339(&payload.end)
        .map_err(|_| {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                "end must be an RFC 3339 datetime".to_string(),
            )
        })?
        .with_timezone(&Utc);
    if !payload.email.contains('@') {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "email must be a valid address".to_string(),
        ));
    }

    let now = Utc::now();
    match state.policy.validate_slot(now, start, end) {
        Ok(()) => {}
        Err(SlotError::TooSoon) => {
            return Err((
                StatusCode::CONFLICT,
                "Requested time slot can no longer be booked.".to_string(),
            ));
        }
        Err(e) => return Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
    }

    let Some(calendar_id) = state.calendar_id() else {
        return Err((
            StatusCode::BAD_GATEWAY,
            "Booking calendar is not configured.".to_string(),
        ));
    };

    // Re-verify against the live calendar just before writing.
    let busy = state
        .calendar
        .get_busy_times(&calendar_id, start, end)
        .await
        .map_err(|e| {
            warn!("Error checking availability: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                "Failed to check slot availability".to_string(),
            )
        })?;
    if busy.iter().any(|b| overlaps((start, end), *b)) {
        return Err((
            StatusCode::CONFLICT,
            "Requested time slot is no longer available.".to_string(),
        ));
    }

    let attendee_name = payload
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            payload
                .email
                .split('@')
                .next()
                .unwrap_or("client")
                .to_string()
        });
    let topic = payload.topic.clone().unwrap_or_else(|| "consultation".to_string());
    let mut description = format!(
        "Client : {}\nEmail  : {}\n",
        attendee_name, payload.email
    );
    if let Some(phone) = payload.phone.as_deref().filter(|p| !p.is_empty()) {
        description.push_str(&format!("Tél.   : {}\n", phone));
    }
    description.push_str(&format!("Sujet  : {}\n", topic));

    let event = CalendarEvent {
        start_time: start.to_rfc3339(),
        end_time: end.to_rfc3339(),
        summary: format!("{} – {}", state.policy.summary_prefix, attendee_name),
        description: Some(description),
        request_meet_link: true,
    };

    let created = match state.calendar.create_event(&calendar_id, event).await {
        Ok(created) => created,
        Err(e) => {
            if matches!(service_error(&e), Some(GcalServiceError::Conflict)) {
                return Err((
                    StatusCode::CONFLICT,
                    "Requested time slot is no longer available.".to_string(),
                ));
            }
            warn!("Failed to create event: {}", e);
            return Err((
                StatusCode::BAD_GATEWAY,
                "Could not create calendar event.".to_string(),
            ));
        }
    };
    info!("Successfully created event: {:?}", created.event_id);

    // Confirmation email is best-effort; a failure never fails the booking.
    if let Some(mailer) = &state.mailer {
        let start_fmt = start
            .with_timezone(&state.policy.tz)
            .format("%d/%m/%Y à %H:%M")
            .to_string();
        let (sender_name, contact_address) = state.sender_identity();
        let mail = confirmation::booking_confirmation(
            &attendee_name,
            &start_fmt,
            created.meet_link.as_deref(),
            &sender_name,
            &contact_address,
        );
        if let Err(e) = mailer
            .send_email(&payload.email, &mail.subject, &mail.text, Some(&mail.html))
            .await
        {
            warn!("Confirmation email failed (non-fatal): {}", e);
        }
    }

    Ok(Json(BookingResponse {
        event_id: created.event_id,
        meet_link: created.meet_link,
        html_link: created.html_link,
        start: start.to_rfc3339(),
        end: end.to_rfc3339(),
    }))
}

/// Canary endpoint to verify the deployed version.
#[axum::debug_handler]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "booking".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler to list booked events in a date range (admin surface).
#[axum::debug_handler]
pub async fn get_booked_events_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<BookedEventsQuery>,
) -> Result<Json<BookedEventsResponse>, (StatusCode, String)> {
    let start_naive_date =
        NaiveDate::parse_from_str(&query.start_date, "%Y-%m-%d").map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "Invalid start_date format (YYYY-MM-DD)".to_string(),
            )
        })?;
    let end_naive_date = NaiveDate::parse_from_str(&query.end_date, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid end_date format (YYYY-MM-DD)".to_string(),
        )
    })?;
    if end_naive_date < start_naive_date {
        return Err((
            StatusCode::BAD_REQUEST,
            "end_date must be after start_date".to_string(),
        ));
    }

    let tz = state.policy.tz;
    let range_start = tz
        .from_local_datetime(&start_naive_date.and_hms_opt(0, 0, 0).unwrap())
        .earliest()
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "start_date is not a valid local time".to_string(),
            )
        })?
        .with_timezone(&Utc);
    // Add 1 day to end_date so the full end day is included.
    let range_end = tz
        .from_local_datetime(&(end_naive_date + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap())
        .earliest()
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "end_date is not a valid local time".to_string(),
            )
        })?
        .with_timezone(&Utc);

    let Some(calendar_id) = state.calendar_id() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Booking calendar is not configured.".to_string(),
        ));
    };

    let include_cancelled = query.include_cancelled.unwrap_or(false);
    match state
        .calendar
        .get_booked_events(&calendar_id, range_start, range_end, include_cancelled)
        .await
    {
        Ok(events) => Ok(Json(BookedEventsResponse { events })),
        Err(e) => {
            warn!("Error fetching booked events: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch booked events".to_string(),
            ))
        }
    }
}

/// Handler to delete a booking completely from the calendar (admin surface).
#[axum::debug_handler]
pub async fn delete_event_handler(
    State(state): State<Arc<BookingState>>,
    Path(event_id): Path<String>,
    Query(params): Query<CancelBookingRequest>,
) -> Result<Json<CancellationResponse>, (StatusCode, String)> {
    let Some(calendar_id) = state.calendar_id() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Booking calendar is not configured.".to_string(),
        ));
    };
    let notify_attendees = params.notify_attendees.unwrap_or(true);

    match state
        .calendar
        .delete_event(&calendar_id, &event_id, notify_attendees)
        .await
    {
        Ok(()) => Ok(Json(CancellationResponse {
            success: true,
            message: "Event deleted successfully.".to_string(),
        })),
        Err(e) => {
            warn!("Error deleting event: {}", e);
            match service_error(&e) {
                Some(GcalServiceError::NotFound(_)) => {
                    Err((StatusCode::NOT_FOUND, "Event not found.".to_string()))
                }
                Some(GcalServiceError::ApiError(api)) if api.to_string().contains("404") => {
                    Err((StatusCode::NOT_FOUND, "Event not found.".to_string()))
                }
                _ => Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to delete event.".to_string(),
                )),
            }
        }
    }
}

/// Handler to mark a booking as cancelled without deleting it (admin surface).
#[axum::debug_handler]
pub async fn mark_booking_cancelled_handler(
    State(state): State<Arc<BookingState>>,
    Path(event_id): Path<String>,
    Query(params): Query<CancelBookingRequest>,
) -> Result<Json<CancellationResponse>, (StatusCode, String)> {
    let Some(calendar_id) = state.calendar_id() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Booking calendar is not configured.".to_string(),
        ));
    };
    let notify_attendees = params.notify_attendees.unwrap_or(true);

    match state
        .calendar
        .mark_event_cancelled(&calendar_id, &event_id, notify_attendees)
        .await
    {
        Ok(_) => Ok(Json(CancellationResponse {
            success: true,
            message: "Appointment marked as cancelled successfully.".to_string(),
        })),
        Err(e) => {
            warn!("Error marking event as cancelled: {}", e);
            match service_error(&e) {
                Some(GcalServiceError::NotFound(_)) => {
                    Err((StatusCode::NOT_FOUND, "Event not found.".to_string()))
                }
                Some(GcalServiceError::ApiError(api)) if api.to_string().contains("404") => {
                    Err((StatusCode::NOT_FOUND, "Event not found.".to_string()))
                }
                _ => Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to mark appointment as cancelled.".to_string(),
                )),
            }
        }
    }
}
