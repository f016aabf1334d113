// File: crates/bookwise_gcal/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::logic::{
    AvailabilityQuery, AvailableSlotsResponse, BookSlotRequest, BookedEventsQuery,
    BookedEventsResponse, BookingResponse, CancelBookingRequest, CancellationResponse, Slot,
    VersionResponse,
};
use bookwise_common::services::BookedEvent;

#[utoipa::path(
    get,
    path = "/booking/availability",
    params(
        ("days" = Option<i64>, Query, description = "Number of days ahead to scan", example = 14),
        ("duration_minutes" = Option<i64>, Query, description = "Requested duration in minutes (the configured slot length is authoritative)", example = 60),
        ("tz" = Option<String>, Query, description = "IANA time zone for display", example = "Europe/Paris")
    ),
    responses(
        (status = 200, description = "Free slots; empty with a warning when the calendar cannot be consulted", body = AvailableSlotsResponse),
        (status = 400, description = "days out of range", body = String)
    )
)]
fn doc_get_availability_handler() {}

#[utoipa::path(
    post,
    path = "/booking/book",
    request_body(content = BookSlotRequest, example = json!({
        "start": "2025-05-15T10:00:00+03:00",
        "end": "2025-05-15T11:00:00+03:00",
        "email": "client@example.com",
        "name": "Ada Lovelace",
        "topic": "consultation"
    })),
    responses(
        (status = 200, description = "Booking result", body = BookingResponse,
         example = json!({
             "event_id": "abc123xyz456",
             "meet_link": "https://meet.google.com/abc-defg-hij",
             "html_link": "https://calendar.google.com/event?eid=abc",
             "start": "2025-05-15T07:00:00+00:00",
             "end": "2025-05-15T08:00:00+00:00"
         })
        ),
        (status = 409, description = "Slot already booked or inside the notice window"),
        (status = 422, description = "Malformed or off-schedule slot"),
        (status = 502, description = "Calendar unavailable")
    )
)]
fn doc_book_slot_handler() {}

#[utoipa::path(
    get,
    path = "/booking/version",
    responses(
        (status = 200, description = "Deployed service version", body = VersionResponse)
    )
)]
fn doc_version_handler() {}

#[utoipa::path(
    get,
    path = "/admin/bookings",
    params(
        ("start_date" = String, Query, description = "Start date in YYYY-MM-DD format", example = "2025-05-15", format = "date"),
        ("end_date" = String, Query, description = "End date in YYYY-MM-DD format (inclusive)", example = "2025-05-20", format = "date"),
        ("include_cancelled" = Option<bool>, Query, description = "Whether to include cancelled events", example = false)
    ),
    responses(
        (status = 200, description = "List of booked events", body = BookedEventsResponse),
        (status = 400, description = "Invalid date format", body = String),
        (status = 500, description = "Failed to fetch events", body = String)
    )
)]
fn doc_get_booked_events_handler() {}

#[utoipa::path(
    delete,
    path = "/admin/bookings/{event_id}",
    params(
        ("event_id" = String, Path, description = "The ID of the event to delete"),
        ("notify_attendees" = Option<bool>, Query, description = "Whether to send cancellation notifications")
    ),
    responses(
        (status = 200, description = "Deletion result", body = CancellationResponse),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Deletion failed")
    )
)]
fn doc_delete_event_handler() {}

#[utoipa::path(
    patch,
    path = "/admin/bookings/{event_id}/cancel",
    params(
        ("event_id" = String, Path, description = "The ID of the event to mark as cancelled"),
        ("notify_attendees" = Option<bool>, Query, description = "Whether to send cancellation notifications")
    ),
    responses(
        (status = 200, description = "Cancellation result", body = CancellationResponse),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Cancellation failed")
    )
)]
fn doc_mark_booking_cancelled_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_availability_handler,
        doc_book_slot_handler,
        doc_version_handler,
        doc_get_booked_events_handler,
        doc_delete_event_handler,
        doc_mark_booking_cancelled_handler
    ),
    components(
        schemas(
            AvailabilityQuery,
            AvailableSlotsResponse,
            Slot,
            BookSlotRequest,
            BookingResponse,
            CancelBookingRequest,
            CancellationResponse,
            BookedEventsQuery,
            BookedEvent,
            BookedEventsResponse,
            VersionResponse
        )
    ),
    tags(
        (name = "booking", description = "Calendar booking API")
    ),
    servers(
        (url = "/api", description = "Main API prefix")
    )
)]
pub struct BookingApiDoc;
