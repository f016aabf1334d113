// --- File: crates/bookwise_gcal/src/logic.rs ---
//! The slot engine: schedule policy, candidate generation, busy-interval
//! reconciliation, and the booking validation gate.
//!
//! Everything here is pure time arithmetic. Functions that depend on the
//! current instant take `now` as an argument; the handlers pass `Utc::now()`.

use bookwise_config::BookingConfig;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use bookwise_common::services::BookedEvent;

/// Why a requested slot was rejected before any calendar I/O.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SlotError {
    #[error("end time must be after start time")]
    BadRange,
    #[error("slot must be exactly {0} minutes long")]
    WrongLength(i64),
    #[error("slot must start on a {0}-minute boundary")]
    Misaligned(i64),
    #[error("slot is outside working hours")]
    OutsideHours,
    #[error("slot starts inside the minimum notice window")]
    TooSoon,
}

/// The bookable week: time zone, working hours and days, slot length, and
/// the minimum notice a client must give before a slot may start.
#[derive(Debug, Clone)]
pub struct SchedulePolicy {
    pub tz: Tz,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub working_days: Vec<Weekday>,
    pub slot_len: Duration,
    pub min_notice: Duration,
    pub max_scan_days: i64,
    pub summary_prefix: String,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy {
            tz: chrono_tz::Asia::Jerusalem,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            working_days: vec![
                Weekday::Sun,
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
            ],
            slot_len: Duration::minutes(60),
            min_notice: Duration::minutes(60),
            max_scan_days: 60,
            summary_prefix: "Consultation".to_string(),
        }
    }
}

fn parse_work_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").ok()
}

fn parse_weekday(raw: &str) -> Option<Weekday> {
    match raw {
        "Sun" => Some(Weekday::Sun),
        "Mon" => Some(Weekday::Mon),
        "Tue" => Some(Weekday::Tue),
        "Wed" => Some(Weekday::Wed),
        "Thu" => Some(Weekday::Thu),
        "Fri" => Some(Weekday::Fri),
        "Sat" => Some(Weekday::Sat),
        _ => None,
    }
}

impl SchedulePolicy {
    /// Build a policy from the optional booking section. Missing or
    /// unparseable values fall back to the defaults with a warning, so a
    /// bad config degrades the schedule instead of refusing to start.
    pub fn from_config(config: Option<&BookingConfig>) -> Self {
        let mut policy = SchedulePolicy::default();
        let Some(config) = config else {
            return policy;
        };

        if let Some(tz_name) = &config.time_zone {
            match Tz::from_str(tz_name) {
                Ok(tz) => policy.tz = tz,
                Err(_) => warn!("unknown time zone {:?}, keeping {}", tz_name, policy.tz),
            }
        }
        if let Some(raw) = &config.work_start_time {
            match parse_work_time(raw) {
                Some(t) => policy.work_start = t,
                None => warn!("invalid work_start_time {:?}, keeping default", raw),
            }
        }
        if let Some(raw) = &config.work_end_time {
            match parse_work_time(raw) {
                Some(t) => policy.work_end = t,
                None => warn!("invalid work_end_time {:?}, keeping default", raw),
            }
        }
        if policy.work_start >= policy.work_end {
            warn!("work_start_time is not before work_end_time, reverting to defaults");
            let defaults = SchedulePolicy::default();
            policy.work_start = defaults.work_start;
            policy.work_end = defaults.work_end;
        }
        if let Some(days) = &config.working_days {
            let parsed: Vec<Weekday> = days.iter().filter_map(|d| parse_weekday(d)).collect();
            if parsed.is_empty() {
                warn!("working_days {:?} contains no valid day names, keeping default", days);
            } else {
                policy.working_days = parsed;
            }
        }
        if let Some(minutes) = config.slot_duration_minutes {
            if (5..=24 * 60).contains(&minutes) {
                policy.slot_len = Duration::minutes(minutes);
            } else {
                warn!("slot_duration_minutes {} out of range, keeping default", minutes);
            }
        }
        if let Some(minutes) = config.min_notice_minutes {
            if minutes >= 0 {
                policy.min_notice = Duration::minutes(minutes);
            } else {
                warn!("min_notice_minutes {} is negative, keeping default", minutes);
            }
        }
        if let Some(days) = config.max_scan_days {
            if days >= 1 {
                policy.max_scan_days = days;
            }
        }
        if let Some(prefix) = &config.event_summary_prefix {
            policy.summary_prefix = prefix.clone();
        }
        policy
    }

    pub fn slot_minutes(&self) -> i64 {
        self.slot_len.num_minutes()
    }

    /// Round `t` up to the next slot boundary. The grid is anchored at local
    /// midnight and follows the local clock, so DST days shift it with them.
    pub fn ceil_to_grid(&self, t: DateTime<Tz>) -> DateTime<Tz> {
        let slot_secs = self.slot_len.num_seconds();
        let into_day = i64::from(t.time().num_seconds_from_midnight());
        let rem = into_day % slot_secs;
        let floor =
            t - Duration::seconds(rem) - Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()));
        if floor < t {
            floor + self.slot_len
        } else {
            floor
        }
    }

    /// The first instant a slot may start, given the minimum notice:
    /// `now + min_notice`, ceiled to the slot grid in the policy time zone.
    /// No slot starting before this is ever offered or accepted.
    pub fn earliest_bookable(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        self.ceil_to_grid((now + self.min_notice).with_timezone(&self.tz))
    }

    /// Whether a slot lies inside the bookable week: working day, starts at
    /// or after `work_start`, strictly before `work_end`, and ends by
    /// `work_end` on the same local day.
    fn fits_schedule(&self, start: DateTime<Tz>, end: DateTime<Tz>) -> bool {
        let start_time = start.time();
        let end_time = end.time();
        self.working_days.contains(&start.weekday())
            && start_time >= self.work_start
            && start_time < self.work_end
            && start.date_naive() == end.date_naive()
            && end_time <= self.work_end
    }

    /// Generate every schedulable slot between `from` and `until`, walking
    /// the boundary grid in absolute time.
    pub fn candidate_slots(
        &self,
        from: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut slots = Vec::new();
        let mut current = self.ceil_to_grid(from);
        while current < until {
            let end = current + self.slot_len;
            if self.fits_schedule(current, end) {
                slots.push((current.with_timezone(&Utc), end.with_timezone(&Utc)));
            }
            current = current + self.slot_len;
        }
        slots
    }

    /// The validation gate for a booking request. The order is fixed and
    /// every check runs before any calendar I/O: a client that skips the
    /// availability endpoint cannot obtain an off-grid or short-notice slot,
    /// and cannot use the remote conflict check as an oracle for slots it
    /// could never book.
    pub fn validate_slot(
        &self,
        now: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), SlotError> {
        if end <= start {
            return Err(SlotError::BadRange);
        }
        if end - start != self.slot_len {
            return Err(SlotError::WrongLength(self.slot_minutes()));
        }
        let local_start = start.with_timezone(&self.tz);
        let local_end = end.with_timezone(&self.tz);
        if self.ceil_to_grid(local_start) != local_start {
            return Err(SlotError::Misaligned(self.slot_minutes()));
        }
        if !self.fits_schedule(local_start, local_end) {
            return Err(SlotError::OutsideHours);
        }
        if local_start < self.earliest_bookable(now) {
            return Err(SlotError::TooSoon);
        }
        Ok(())
    }
}

/// Coalesce overlapping or adjacent busy intervals into a sorted minimal set.
pub fn merge_busy_periods(
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if busy.is_empty() {
        return vec![];
    }
    let mut sorted = busy.to_vec();
    sorted.sort_by_key(|(start, _)| *start);
    let mut merged = vec![sorted[0]];
    for &(start, end) in &sorted[1..] {
        let last = merged.last_mut().unwrap();
        if start <= last.1 {
            last.1 = last.1.max(end);
        } else {
            merged.push((start, end));
        }
    }
    merged
}

/// Whether a slot overlaps a busy interval.
pub fn overlaps(
    slot: (DateTime<Utc>, DateTime<Utc>),
    busy: (DateTime<Utc>, DateTime<Utc>),
) -> bool {
    slot.0 < busy.1 && slot.1 > busy.0
}

/// Drop every candidate slot that overlaps any busy interval.
pub fn free_slots(
    candidates: &[(DateTime<Utc>, DateTime<Utc>)],
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let merged = merge_busy_periods(busy);
    candidates
        .iter()
        .copied()
        .filter(|slot| !merged.iter().any(|b| overlaps(*slot, *b)))
        .collect()
}

// --- HTTP data structures ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AvailabilityQuery {
    /// Number of days ahead to scan (default 14).
    #[cfg_attr(feature = "openapi", schema(example = 14))]
    pub days: Option<i64>,

    /// Requested duration in minutes. Accepted for interface compatibility;
    /// the configured slot length is authoritative.
    #[cfg_attr(feature = "openapi", schema(example = 60))]
    pub duration_minutes: Option<i64>,

    /// IANA time zone for displaying the slots (default: schedule zone).
    #[cfg_attr(feature = "openapi", schema(example = "Europe/Paris"))]
    pub tz: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Slot {
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-15T10:00:00+03:00"))]
    pub start: String, // RFC 3339, display time zone
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-15T11:00:00+03:00"))]
    pub end: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailableSlotsResponse {
    pub slots: Vec<Slot>,
    /// Set when the calendar could not be consulted and the list is empty
    /// for that reason rather than because everything is booked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookSlotRequest {
    /// Slot start, RFC 3339.
    pub start: String,
    /// Slot end, RFC 3339.
    pub end: String,
    /// Client email address, used for the confirmation message.
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub topic: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingResponse {
    pub event_id: Option<String>,
    pub meet_link: Option<String>,
    pub html_link: Option<String>,
    pub start: String,
    pub end: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub notify_attendees: Option<bool>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct CancellationResponse {
    pub success: bool,
    pub message: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct BookedEventsQuery {
    pub start_date: String,              // YYYY-MM-DD format
    pub end_date: String,                // YYYY-MM-DD format
    pub include_cancelled: Option<bool>, // Whether to include cancelled events
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct BookedEventsResponse {
    pub events: Vec<BookedEvent>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VersionResponse {
    pub service: String,
    pub version: String,
}
