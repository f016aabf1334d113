#[cfg(test)]
mod tests {
    use crate::handlers::{
        book_slot_handler, delete_event_handler, get_availability_handler,
        get_booked_events_handler, mark_booking_cancelled_handler, version_handler, BookingState,
    };
    use crate::logic::{
        AvailabilityQuery, BookSlotRequest, BookedEventsQuery, CancelBookingRequest,
        SchedulePolicy,
    };
    use crate::service::mock::MockCalendarService;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use bookwise_common::services::{
        Boxed, BoxFuture, BoxedError, CalendarEvent, CalendarService, NotificationResult,
        NotificationService,
    };
    use bookwise_config::{AppConfig, GcalConfig, ServerConfig, SmtpConfig};
    use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    const CALENDAR_ID: &str = "bookings@example.com";

    /// Mailer that records every send instead of talking to a server.
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl NotificationService for RecordingMailer {
        type Error = Infallible;

        fn send_email(
            &self,
            to: &str,
            subject: &str,
            _text_body: &str,
            _html_body: Option<&str>,
        ) -> BoxFuture<'_, NotificationResult, Self::Error> {
            let to = to.to_string();
            let subject = subject.to_string();
            Box::pin(async move {
                self.sent.lock().unwrap().push((to, subject));
                Ok(NotificationResult {
                    id: "recorded".to_string(),
                    status: "sent".to_string(),
                })
            })
        }
    }

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8086,
            },
            use_gcal: true,
            use_smtp: true,
            gcal: Some(GcalConfig {
                key_path: Some("test_key.json".to_string()),
                calendar_id: Some(CALENDAR_ID.to_string()),
            }),
            booking: None,
            smtp: Some(SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 465,
                username: "contact@example.com".to_string(),
                from_address: "contact@example.com".to_string(),
                from_name: Some("L'équipe".to_string()),
                reply_to: None,
            }),
        })
    }

    fn state_with(
        mock: Arc<MockCalendarService>,
        mailer: Option<Arc<RecordingMailer>>,
    ) -> Arc<BookingState> {
        let calendar: Arc<dyn CalendarService<Error = BoxedError>> =
            Arc::new(Boxed(Arc::clone(&mock)));
        let mailer = mailer.map(|m| {
            let boxed: Arc<dyn NotificationService<Error = BoxedError>> = Arc::new(Boxed(m));
            boxed
        });
        Arc::new(BookingState::new(test_config(), calendar, mailer))
    }

    /// A slot far enough in the future that it is still valid by the time
    /// the handler checks it, whatever the wall clock says.
    fn future_slot(policy: &SchedulePolicy) -> (DateTime<Utc>, DateTime<Utc>) {
        let window_start = policy.earliest_bookable(Utc::now() + Duration::hours(2));
        let until = window_start + Duration::days(14);
        policy.candidate_slots(window_start, until)[0]
    }

    /// A grid-aligned in-hours slot in the recent past.
    fn past_slot(policy: &SchedulePolicy) -> (DateTime<Utc>, DateTime<Utc>) {
        let now_local = Utc::now().with_timezone(&policy.tz);
        for days_back in 1..=7 {
            let day = now_local - Duration::days(days_back);
            if policy.working_days.contains(&day.weekday()) {
                let start = policy
                    .tz
                    .with_ymd_and_hms(day.year(), day.month(), day.day(), 10, 0, 0)
                    .unwrap()
                    .with_timezone(&Utc);
                return (start, start + Duration::minutes(60));
            }
        }
        unreachable!("a working day exists in any trailing week");
    }

    fn availability_query(days: i64) -> Query<AvailabilityQuery> {
        Query(AvailabilityQuery {
            days: Some(days),
            duration_minutes: None,
            tz: None,
        })
    }

    fn book_request(slot: (DateTime<Utc>, DateTime<Utc>)) -> Json<BookSlotRequest> {
        Json(BookSlotRequest {
            start: slot.0.to_rfc3339(),
            end: slot.1.to_rfc3339(),
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            phone: Some("+972 50 000 0000".to_string()),
            topic: None,
        })
    }

    #[tokio::test]
    async fn availability_returns_slots_on_an_empty_calendar() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(Arc::clone(&mock), None);

        let Json(response) = get_availability_handler(State(state), availability_query(7))
            .await
            .expect("availability should succeed");

        assert!(response.warning.is_none());
        assert!(
            !response.slots.is_empty(),
            "a 7-day window always contains working days"
        );
        for slot in &response.slots {
            let start = DateTime::parse_from_rfc3339(&slot.start).unwrap();
            let end = DateTime::parse_from_rfc3339(&slot.end).unwrap();
            assert_eq!(end - start, Duration::minutes(60));
        }
    }

    #[tokio::test]
    async fn availability_excludes_slots_busy_on_the_calendar() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(Arc::clone(&mock), None);
        let taken = future_slot(&state.policy);
        mock.seed_event(
            CALENDAR_ID,
            CalendarEvent {
                start_time: taken.0.to_rfc3339(),
                end_time: taken.1.to_rfc3339(),
                summary: "Existing meeting".to_string(),
                description: None,
                request_meet_link: false,
            },
        );

        let Json(response) = get_availability_handler(State(state), availability_query(14))
            .await
            .expect("availability should succeed");

        for slot in &response.slots {
            let start = DateTime::parse_from_rfc3339(&slot.start)
                .unwrap()
                .with_timezone(&Utc);
            assert_ne!(start, taken.0, "taken slot must not be offered");
        }
    }

    #[tokio::test]
    async fn availability_degrades_when_the_calendar_is_unreachable() {
        let mock = Arc::new(MockCalendarService::failing());
        let state = state_with(mock, None);

        let Json(response) = get_availability_handler(State(state), availability_query(7))
            .await
            .expect("degraded availability is still a 200");

        assert!(response.slots.is_empty());
        assert!(response.warning.is_some());
    }

    #[tokio::test]
    async fn availability_rejects_days_out_of_range() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(mock, None);

        let err = get_availability_handler(State(Arc::clone(&state)), availability_query(0))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = get_availability_handler(State(state), availability_query(61))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn booking_a_free_slot_creates_the_event_and_sends_mail() {
        let mock = Arc::new(MockCalendarService::new());
        let mailer = Arc::new(RecordingMailer::new());
        let state = state_with(Arc::clone(&mock), Some(Arc::clone(&mailer)));
        let slot = future_slot(&state.policy);

        let Json(response) = book_slot_handler(State(state), book_request(slot))
            .await
            .expect("booking should succeed");

        assert!(response.event_id.is_some());
        assert!(response.meet_link.is_some());
        assert_eq!(response.start, slot.0.to_rfc3339());
        assert_eq!(response.end, slot.1.to_rfc3339());

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ada@example.com");
        assert!(sent[0].1.starts_with("Confirmation"));
    }

    #[tokio::test]
    async fn booking_a_taken_slot_returns_conflict() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(Arc::clone(&mock), None);
        let slot = future_slot(&state.policy);
        mock.seed_event(
            CALENDAR_ID,
            CalendarEvent {
                start_time: slot.0.to_rfc3339(),
                end_time: slot.1.to_rfc3339(),
                summary: "Existing meeting".to_string(),
                description: None,
                request_meet_link: false,
            },
        );

        let err = book_slot_handler(State(state), book_request(slot))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn booking_inside_the_notice_window_is_rejected_before_calendar_io() {
        // The calendar is unreachable; a short-notice request must still be
        // rejected with 409, proving the gate runs before any remote call.
        let mock = Arc::new(MockCalendarService::failing());
        let state = state_with(mock, None);
        let slot = past_slot(&state.policy);

        let err = book_slot_handler(State(state), book_request(slot))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert!(err.1.contains("no longer be booked"));
    }

    #[tokio::test]
    async fn booking_rejects_malformed_requests() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(mock, None);
        let slot = future_slot(&state.policy);

        // Unparseable start
        let err = book_slot_handler(
            State(Arc::clone(&state)),
            Json(BookSlotRequest {
                start: "next tuesday".to_string(),
                end: slot.1.to_rfc3339(),
                email: "ada@example.com".to_string(),
                name: None,
                phone: None,
                topic: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        // Wrong length
        let err = book_slot_handler(
            State(Arc::clone(&state)),
            book_request((slot.0, slot.0 + Duration::minutes(90))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        // Off-grid start
        let err = book_slot_handler(
            State(Arc::clone(&state)),
            book_request((
                slot.0 + Duration::minutes(10),
                slot.1 + Duration::minutes(10),
            )),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        // Invalid email
        let err = book_slot_handler(
            State(state),
            Json(BookSlotRequest {
                start: slot.0.to_rfc3339(),
                end: slot.1.to_rfc3339(),
                email: "not-an-address".to_string(),
                name: None,
                phone: None,
                topic: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn admin_list_cancel_and_delete_round_trip() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(Arc::clone(&mock), None);

        // 2030-06-03 is a Monday, 10:00-11:00 IDT
        let start = state
            .policy
            .tz
            .with_ymd_and_hms(2030, 6, 3, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let event_id = mock.seed_event(
            CALENDAR_ID,
            CalendarEvent {
                start_time: start.to_rfc3339(),
                end_time: (start + Duration::minutes(60)).to_rfc3339(),
                summary: "Consultation – Ada".to_string(),
                description: None,
                request_meet_link: false,
            },
        );

        let list_query = |include_cancelled| {
            Query(BookedEventsQuery {
                start_date: "2030-06-03".to_string(),
                end_date: "2030-06-03".to_string(),
                include_cancelled: Some(include_cancelled),
            })
        };

        let Json(listed) = get_booked_events_handler(State(Arc::clone(&state)), list_query(false))
            .await
            .expect("listing should succeed");
        assert_eq!(listed.events.len(), 1);
        assert_eq!(listed.events[0].event_id, event_id);

        let Json(cancelled) = mark_booking_cancelled_handler(
            State(Arc::clone(&state)),
            Path(event_id.clone()),
            Query(CancelBookingRequest {
                notify_attendees: Some(false),
            }),
        )
        .await
        .expect("cancelling should succeed");
        assert!(cancelled.success);

        let Json(listed) = get_booked_events_handler(State(Arc::clone(&state)), list_query(false))
            .await
            .unwrap();
        assert!(listed.events.is_empty(), "cancelled events are hidden");

        let Json(listed) = get_booked_events_handler(State(Arc::clone(&state)), list_query(true))
            .await
            .unwrap();
        assert_eq!(listed.events.len(), 1);
        assert_eq!(listed.events[0].status, "cancelled");

        let Json(deleted) = delete_event_handler(
            State(Arc::clone(&state)),
            Path(event_id),
            Query(CancelBookingRequest {
                notify_attendees: None,
            }),
        )
        .await
        .expect("deleting should succeed");
        assert!(deleted.success);

        let Json(listed) = get_booked_events_handler(State(state), list_query(true))
            .await
            .unwrap();
        assert!(listed.events.is_empty());
    }

    #[tokio::test]
    async fn cancelling_an_unknown_event_is_not_found() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(mock, None);

        let err = mark_booking_cancelled_handler(
            State(state),
            Path("missing-event".to_string()),
            Query(CancelBookingRequest {
                notify_attendees: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_list_rejects_bad_dates() {
        let mock = Arc::new(MockCalendarService::new());
        let state = state_with(mock, None);

        let err = get_booked_events_handler(
            State(Arc::clone(&state)),
            Query(BookedEventsQuery {
                start_date: "03/06/2030".to_string(),
                end_date: "2030-06-03".to_string(),
                include_cancelled: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = get_booked_events_handler(
            State(state),
            Query(BookedEventsQuery {
                start_date: "2030-06-04".to_string(),
                end_date: "2030-06-03".to_string(),
                include_cancelled: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn version_reports_the_crate_version() {
        let Json(version) = version_handler().await;
        assert_eq!(version.service, "booking");
        assert_eq!(version.version, env!("CARGO_PKG_VERSION").to_string());
    }
}
