// --- File: crates/bookwise_gcal/src/routes.rs ---

use crate::handlers::{
    book_slot_handler, delete_event_handler, get_availability_handler,
    get_booked_events_handler, mark_booking_cancelled_handler, version_handler, BookingState,
};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all routes for the booking feature. Each
/// operation has exactly one canonical path.
pub fn routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/booking/availability", get(get_availability_handler))
        .route("/booking/book", post(book_slot_handler))
        .route("/booking/version", get(version_handler))
        .route("/admin/bookings", get(get_booked_events_handler))
        .route("/admin/bookings/{event_id}", delete(delete_event_handler))
        .route(
            "/admin/bookings/{event_id}/cancel",
            patch(mark_booking_cancelled_handler),
        )
        .with_state(state)
}
