use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use proptest::prelude::*;

use barberbook::models::{Booking, BookingStatus, TimeOff, WeeklyScheduleEntry};
use barberbook::services::availability::{available_slots, day_of_week, SlotRequest, Snapshot};

// Wednesday
fn target_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 18).unwrap()
}

fn minutes(m: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0).unwrap()
}

fn minute_of(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

fn schedule(start: i64, end: i64) -> Vec<WeeklyScheduleEntry> {
    vec![WeeklyScheduleEntry {
        employee_id: "barber-1".to_string(),
        day_of_week: 3,
        start_time: minutes(start),
        end_time: minutes(end),
    }]
}

fn booking(i: usize, start: i64, len: i64, status: BookingStatus) -> Booking {
    let stamp = target_date().and_hms_opt(0, 0, 0).unwrap();
    Booking {
        id: format!("b{i}"),
        employee_id: "barber-1".to_string(),
        customer_id: "c".to_string(),
        date: target_date(),
        start_time: minutes(start),
        end_time: minutes(start + len),
        status,
        created_at: stamp,
        updated_at: stamp,
    }
}

fn request(duration: i64) -> SlotRequest {
    SlotRequest {
        employee_id: "barber-1".to_string(),
        date: target_date(),
        duration_minutes: duration,
    }
}

// a day before the target date, so the same-day filter never applies
fn yesterday() -> NaiveDateTime {
    (target_date() - Duration::days(1)).and_hms_opt(12, 0, 0).unwrap()
}

fn status_strategy() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::Confirmed),
        Just(BookingStatus::ReminderSent),
        Just(BookingStatus::FollowupInProgress),
        Just(BookingStatus::Completed),
        Just(BookingStatus::Cancelled),
    ]
}

proptest! {
    #[test]
    fn slots_fit_inside_the_working_window(
        start in 0i64..720,
        length in 60i64..600,
        duration in 1i64..120,
    ) {
        let end = (start + length).min(1439);
        prop_assume!(duration <= end - start);
        let snapshot = Snapshot { schedule: schedule(start, end), ..Default::default() };

        let slots = available_slots(&request(duration), &snapshot, yesterday()).unwrap();
        prop_assert!(!slots.is_empty());
        for slot in &slots {
            prop_assert!(minute_of(*slot) >= start);
            prop_assert!(minute_of(*slot) + duration <= end);
        }
        prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn slots_never_overlap_occupying_bookings(
        bookings in prop::collection::vec((600i64..1100, 10i64..90, status_strategy()), 0..6),
        duration in 10i64..60,
    ) {
        let bookings: Vec<Booking> = bookings
            .into_iter()
            .enumerate()
            .map(|(i, (s, len, status))| booking(i, s, len, status))
            .collect();
        let snapshot = Snapshot {
            schedule: schedule(600, 1140),
            time_off: vec![],
            bookings: bookings.clone(),
        };

        let slots = available_slots(&request(duration), &snapshot, yesterday()).unwrap();
        for slot in &slots {
            let s = minute_of(*slot);
            for b in bookings.iter().filter(|b| b.status.is_occupying()) {
                let (bs, be) = (minute_of(b.start_time), minute_of(b.end_time));
                prop_assert!(!(s < be && s + duration > bs));
            }
        }
    }

    #[test]
    fn time_off_always_empties_the_day(
        bookings in prop::collection::vec((600i64..1100, 10i64..90), 0..4),
        duration in 10i64..60,
    ) {
        let snapshot = Snapshot {
            schedule: schedule(600, 1140),
            time_off: vec![TimeOff {
                id: "off".to_string(),
                employee_id: "barber-1".to_string(),
                date: target_date(),
                reason: None,
            }],
            bookings: bookings
                .into_iter()
                .enumerate()
                .map(|(i, (s, len))| booking(i, s, len, BookingStatus::Confirmed))
                .collect(),
        };
        let slots = available_slots(&request(duration), &snapshot, yesterday()).unwrap();
        prop_assert!(slots.is_empty());
    }

    #[test]
    fn same_day_slots_are_strictly_in_the_future(now_minute in 0i64..1439, duration in 10i64..60) {
        let snapshot = Snapshot { schedule: schedule(600, 1140), ..Default::default() };
        let now = target_date().and_time(minutes(now_minute));

        let slots = available_slots(&request(duration), &snapshot, now).unwrap();
        for slot in &slots {
            prop_assert!(*slot > now.time());
        }
    }

    #[test]
    fn day_of_week_is_iso_and_total(days in 0i64..20_000) {
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(days);
        let dow = day_of_week(date);
        prop_assert!((1..=7).contains(&dow));
        prop_assert_eq!(u32::from(dow), date.weekday().number_from_monday());
    }

    #[test]
    fn identical_inputs_give_identical_output(
        bookings in prop::collection::vec((600i64..1100, 10i64..90, status_strategy()), 0..6),
        duration in 10i64..60,
    ) {
        let snapshot = Snapshot {
            schedule: schedule(600, 1140),
            time_off: vec![],
            bookings: bookings
                .into_iter()
                .enumerate()
                .map(|(i, (s, len, status))| booking(i, s, len, status))
                .collect(),
        };
        let first = available_slots(&request(duration), &snapshot, yesterday()).unwrap();
        let second = available_slots(&request(duration), &snapshot, yesterday()).unwrap();
        prop_assert_eq!(first, second);
    }
}
