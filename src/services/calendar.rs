use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::{Booking, Employee};
use crate::services::availability::{self, DayStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Working,
    DayOff,
    TimeOff,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub day_of_week: u8,
    pub status: DayKind,
    #[serde(skip_serializing_if = "Option::is_none", with = "opt_hhmm")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none", with = "opt_hhmm")]
    pub end_time: Option<NaiveTime>,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub employee_id: String,
    pub employee_name: String,
    pub week_start: NaiveDate,
    pub days: Vec<DayView>,
}

mod opt_hhmm {
    use chrono::NaiveTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&crate::models::time::format_time(*t)),
            None => s.serialize_none(),
        }
    }
}

/// The Monday on or before `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Seven days of hours and occupying bookings, Monday first.
pub fn week_view(
    conn: &Connection,
    employee: &Employee,
    start: NaiveDate,
) -> anyhow::Result<WeekView> {
    let week_start = monday_of(start);
    let week_end = week_start + Duration::days(6);

    let schedule = queries::get_schedule(conn, &employee.id)?;
    let time_off = queries::list_time_off(conn, &employee.id)?;
    let bookings =
        queries::bookings_for_employee_between(conn, &employee.id, week_start, week_end)?;

    let mut days = Vec::with_capacity(7);
    for offset in 0..7 {
        let date = week_start + Duration::days(offset);
        let (status, start_time, end_time) =
            match availability::day_status(&employee.id, date, &schedule, &time_off)? {
                DayStatus::TimeOff => (DayKind::TimeOff, None, None),
                DayStatus::DayOff => (DayKind::DayOff, None, None),
                DayStatus::Working { start, end } => (DayKind::Working, Some(start), Some(end)),
            };
        let day_bookings = bookings
            .iter()
            .filter(|b| b.date == date && b.status.is_occupying())
            .cloned()
            .collect();
        days.push(DayView {
            date,
            day_of_week: availability::day_of_week(date),
            status,
            start_time,
            end_time,
            bookings: day_bookings,
        });
    }

    Ok(WeekView {
        employee_id: employee.id.clone(),
        employee_name: employee.name.clone(),
        week_start,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BookingStatus, TimeOff, WeeklyScheduleEntry};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn barber() -> Employee {
        Employee {
            id: "barber-1".to_string(),
            name: "Rozer".to_string(),
            phone: None,
            bio: None,
        }
    }

    #[test]
    fn test_monday_of() {
        assert_eq!(monday_of(d("2025-06-18")), d("2025-06-16"));
        assert_eq!(monday_of(d("2025-06-16")), d("2025-06-16"));
        assert_eq!(monday_of(d("2025-06-22")), d("2025-06-16"));
    }

    #[test]
    fn test_week_view_marks_each_day() {
        let conn = db::init_db(":memory:").unwrap();
        queries::create_employee(&conn, &barber()).unwrap();
        let entry = |dow| WeeklyScheduleEntry {
            employee_id: "barber-1".to_string(),
            day_of_week: dow,
            start_time: t("10:00"),
            end_time: t("18:00"),
        };
        queries::replace_schedule(&conn, "barber-1", &[entry(2), entry(3)]).unwrap();
        queries::add_time_off(
            &conn,
            &TimeOff {
                id: "off-1".to_string(),
                employee_id: "barber-1".to_string(),
                date: d("2025-06-18"),
                reason: Some("dentist".to_string()),
            },
        )
        .unwrap();

        let week = week_view(&conn, &barber(), d("2025-06-19")).unwrap();
        assert_eq!(week.week_start, d("2025-06-16"));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].status, DayKind::DayOff);
        assert_eq!(week.days[1].status, DayKind::Working);
        assert_eq!(week.days[1].start_time, Some(t("10:00")));
        assert_eq!(week.days[2].status, DayKind::TimeOff);
        assert_eq!(week.days[2].start_time, None);
        assert_eq!(week.days[6].day_of_week, 7);
    }

    #[test]
    fn test_week_view_excludes_cancelled_bookings() {
        let conn = db::init_db(":memory:").unwrap();
        queries::create_employee(&conn, &barber()).unwrap();
        let customer =
            queries::find_or_create_customer(&conn, "Alice", "+15550001111", None).unwrap();
        let stamp = d("2025-06-01").and_hms_opt(0, 0, 0).unwrap();
        for (id, start, status) in [
            ("kept", "10:00", BookingStatus::Confirmed),
            ("dropped", "11:00", BookingStatus::Cancelled),
        ] {
            let booking = Booking {
                id: id.to_string(),
                employee_id: "barber-1".to_string(),
                customer_id: customer.id.clone(),
                date: d("2025-06-17"),
                start_time: t(start),
                end_time: t(start) + Duration::minutes(30),
                status,
                created_at: stamp,
                updated_at: stamp,
            };
            assert!(queries::insert_booking_if_free(&conn, &booking).unwrap());
        }

        let week = week_view(&conn, &barber(), d("2025-06-16")).unwrap();
        let ids: Vec<_> = week.days[1].bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["kept"]);
    }
}
