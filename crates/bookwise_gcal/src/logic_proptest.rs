#[cfg(test)]
mod tests {
    use crate::logic::{free_slots, overlaps, SchedulePolicy};
    use chrono::{Datelike, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    // All generated windows stay inside May-June 2025 so no DST transition
    // lands in the middle of a case (Israel switches in March and October).

    proptest! {
        #[test]
        fn candidate_slots_stay_inside_the_schedule(
            day_offset in 0i64..28,
            window_days in 1i64..10,
            slot_minutes in prop::sample::select(vec![30i64, 45, 60, 90]),
        ) {
            let mut policy = SchedulePolicy::default();
            policy.slot_len = Duration::minutes(slot_minutes);

            let from = policy.tz.with_ymd_and_hms(2025, 5, 4, 0, 0, 0).unwrap()
                + Duration::days(day_offset);
            let until = from + Duration::days(window_days);

            for (start, end) in policy.candidate_slots(from, until) {
                let local_start = start.with_timezone(&policy.tz);
                let local_end = end.with_timezone(&policy.tz);
                prop_assert!(policy.working_days.contains(&local_start.weekday()));
                prop_assert!(local_start.time() >= policy.work_start);
                prop_assert!(local_start.time() < policy.work_end);
                prop_assert!(local_end.time() <= policy.work_end);
                prop_assert_eq!(end - start, policy.slot_len);
            }
        }

        #[test]
        fn free_slots_never_overlap_any_busy_interval(
            busy_spec in prop::collection::vec((0i64..72, 1i64..4), 0..6),
        ) {
            let policy = SchedulePolicy::default();
            let from = policy.tz.with_ymd_and_hms(2025, 5, 4, 0, 0, 0).unwrap();
            let until = from + Duration::days(3);
            let candidates = policy.candidate_slots(from, until);

            let base = from.with_timezone(&Utc);
            let busy: Vec<_> = busy_spec
                .iter()
                .map(|(offset_hours, len_hours)| {
                    (
                        base + Duration::hours(*offset_hours),
                        base + Duration::hours(offset_hours + len_hours),
                    )
                })
                .collect();

            for slot in free_slots(&candidates, &busy) {
                for interval in &busy {
                    prop_assert!(!overlaps(slot, *interval));
                }
            }
        }

        #[test]
        fn every_offered_slot_passes_the_booking_gate(
            now_minutes in 0i64..(5 * 24 * 60),
            notice_minutes in prop::sample::select(vec![0i64, 30, 60, 120]),
        ) {
            let mut policy = SchedulePolicy::default();
            policy.min_notice = Duration::minutes(notice_minutes);

            let now = Utc.with_ymd_and_hms(2025, 5, 4, 0, 0, 0).unwrap()
                + Duration::minutes(now_minutes);
            let window_start = policy.earliest_bookable(now);
            let until = window_start + Duration::days(7);

            for (start, end) in policy.candidate_slots(window_start, until) {
                prop_assert!(start >= now + policy.min_notice);
                prop_assert!(policy.validate_slot(now, start, end).is_ok());
            }
        }
    }
}
