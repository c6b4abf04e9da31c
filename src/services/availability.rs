//! Bookable start times for one barber on one date.
//!
//! Everything here is pure: callers hand in a snapshot of schedule, time-off
//! and bookings plus the current business-local time, and get back either an
//! ascending list of start times or an [`AvailabilityError`]. "No slots" for
//! any reason (day off, time off, fully booked, too late today) is an empty
//! list, never an error.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::time::{format_date, minute_of_day, time_from_minutes};
use crate::models::{Booking, TimeOff, WeeklyScheduleEntry};

/// Candidate start times are generated on this grid, anchored at the start of
/// the working day.
pub const SLOT_STEP_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("data integrity error: {0}")]
    DataIntegrity(String),
}

/// ISO weekday number: Monday = 1 .. Sunday = 7.
///
/// Works on the civil date alone, so the result never depends on the
/// timezone the process runs in.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub employee_id: String,
    pub date: NaiveDate,
    pub duration_minutes: i64,
}

/// Caller-supplied view of the data the engine reads. Rows for other
/// employees, other dates and non-occupying statuses are ignored.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub schedule: Vec<WeeklyScheduleEntry>,
    pub time_off: Vec<TimeOff>,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    TimeOff,
    DayOff,
    Working { start: NaiveTime, end: NaiveTime },
}

/// Half-open `[start, end)` range in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

pub fn day_status(
    employee_id: &str,
    date: NaiveDate,
    schedule: &[WeeklyScheduleEntry],
    time_off: &[TimeOff],
) -> Result<DayStatus, AvailabilityError> {
    if time_off
        .iter()
        .any(|t| t.employee_id == employee_id && t.date == date)
    {
        return Ok(DayStatus::TimeOff);
    }

    let dow = day_of_week(date);
    let mut entries = schedule
        .iter()
        .filter(|e| e.employee_id == employee_id && e.day_of_week == dow);

    let Some(entry) = entries.next() else {
        return Ok(DayStatus::DayOff);
    };
    if entries.next().is_some() {
        return Err(AvailabilityError::DataIntegrity(format!(
            "employee {employee_id} has more than one schedule entry for day {dow}"
        )));
    }
    if entry.end_time <= entry.start_time {
        return Err(AvailabilityError::DataIntegrity(format!(
            "schedule for employee {employee_id} on day {dow} ends before it starts"
        )));
    }

    Ok(DayStatus::Working {
        start: entry.start_time,
        end: entry.end_time,
    })
}

/// Time ranges held by occupying bookings of `employee_id` on `date`.
pub fn occupied_intervals(
    employee_id: &str,
    date: NaiveDate,
    bookings: &[Booking],
) -> Result<Vec<Interval>, AvailabilityError> {
    bookings
        .iter()
        .filter(|b| b.employee_id == employee_id && b.date == date && b.status.is_occupying())
        .map(|b| {
            if b.end_time <= b.start_time {
                return Err(AvailabilityError::DataIntegrity(format!(
                    "booking {} on {} ends before it starts",
                    b.id,
                    format_date(b.date)
                )));
            }
            Ok(Interval {
                start: minute_of_day(b.start_time),
                end: minute_of_day(b.end_time),
            })
        })
        .collect()
}

pub fn available_slots(
    request: &SlotRequest,
    snapshot: &Snapshot,
    now: NaiveDateTime,
) -> Result<Vec<NaiveTime>, AvailabilityError> {
    if request.duration_minutes <= 0 {
        return Err(AvailabilityError::InvalidRequest(format!(
            "duration must be positive, got {}",
            request.duration_minutes
        )));
    }

    let (day_start, day_end) = match day_status(
        &request.employee_id,
        request.date,
        &snapshot.schedule,
        &snapshot.time_off,
    )? {
        DayStatus::TimeOff | DayStatus::DayOff => return Ok(vec![]),
        DayStatus::Working { start, end } => (minute_of_day(start), minute_of_day(end)),
    };
    if request.duration_minutes > day_end - day_start {
        return Ok(vec![]);
    }

    let busy = occupied_intervals(&request.employee_id, request.date, &snapshot.bookings)?;
    let cutoff = (request.date == now.date()).then(|| now.time());

    let mut slots = vec![];
    let mut start = day_start;
    while start + request.duration_minutes <= day_end {
        let candidate = Interval {
            start,
            end: start + request.duration_minutes,
        };
        let free = !busy.iter().any(|b| b.overlaps(&candidate));
        if free {
            if let Some(time) = time_from_minutes(start) {
                if cutoff.map_or(true, |now_time| time > now_time) {
                    slots.push(time);
                }
            }
        }
        start += SLOT_STEP_MINUTES;
    }

    Ok(slots)
}
