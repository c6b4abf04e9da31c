use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, ServiceSelection};
use crate::services::availability::{self, AvailabilityError, SlotRequest};
use crate::services::clock::BusinessClock;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Max time per booking is {max} minutes. Please reduce the number or duration of services.")]
    DurationExceeded { max: i64, requested: i64 },

    #[error("That time is no longer available. Please pick a different time.")]
    SlotUnavailable,

    #[error("Sorry, that time slot was just booked. Please pick a different time.")]
    Conflict,

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub employee_id: String,
    pub date: NaiveDate,
    #[serde(with = "crate::models::time::hhmm")]
    pub time: NaiveTime,
    pub services: Vec<ServiceSelection>,
}

/// Sum of `duration × quantity` over the selected services.
///
/// Zero-quantity lines are ignored; an unknown service id is an error.
pub fn total_duration(
    conn: &Connection,
    selections: &[ServiceSelection],
) -> Result<i64, BookingError> {
    let mut total = 0;
    for selection in selections.iter().filter(|s| s.quantity > 0) {
        let service = queries::get_service(conn, &selection.service_id)?.ok_or_else(|| {
            BookingError::InvalidRequest(format!("unknown service: {}", selection.service_id))
        })?;
        total += service.duration_minutes * i64::from(selection.quantity);
    }
    Ok(total)
}

/// Duration of a booking request, with the per-booking cap applied.
pub fn requested_duration(
    conn: &Connection,
    selections: &[ServiceSelection],
    max_minutes: i64,
) -> Result<i64, BookingError> {
    let total = total_duration(conn, selections)?;
    if total <= 0 {
        return Err(BookingError::InvalidRequest(
            "select at least one service".to_string(),
        ));
    }
    if total > max_minutes {
        return Err(BookingError::DurationExceeded {
            max: max_minutes,
            requested: total,
        });
    }
    Ok(total)
}

/// Bookable start times for a set of services.
pub fn available_times(
    conn: &Connection,
    clock: &BusinessClock,
    employee_id: &str,
    date: NaiveDate,
    selections: &[ServiceSelection],
    max_minutes: i64,
) -> Result<(i64, Vec<NaiveTime>), BookingError> {
    let duration = requested_duration(conn, selections, max_minutes)?;
    let snapshot = queries::availability_snapshot(conn, employee_id, date)?;
    let request = SlotRequest {
        employee_id: employee_id.to_string(),
        date,
        duration_minutes: duration,
    };
    let slots = availability::available_slots(&request, &snapshot, clock.now_local())?;
    Ok((duration, slots))
}

/// Books a slot. The insert is conditional on no overlapping occupying
/// booking existing at write time, so two requests racing for the same slot
/// cannot both succeed.
pub fn create_booking(
    conn: &mut Connection,
    clock: &BusinessClock,
    max_minutes: i64,
    request: &BookingRequest,
) -> Result<Booking, BookingError> {
    let name = request.name.trim();
    let phone = request.phone.trim();
    if name.is_empty() || phone.is_empty() {
        return Err(BookingError::InvalidRequest(
            "name and phone are required".to_string(),
        ));
    }
    if queries::get_employee(conn, &request.employee_id)?.is_none() {
        return Err(BookingError::InvalidRequest(format!(
            "unknown barber: {}",
            request.employee_id
        )));
    }
    if request.date < clock.today() {
        return Err(BookingError::InvalidRequest(
            "cannot book a date in the past".to_string(),
        ));
    }

    let (duration, slots) = available_times(
        conn,
        clock,
        &request.employee_id,
        request.date,
        &request.services,
        max_minutes,
    )?;
    if !slots.contains(&request.time) {
        return Err(BookingError::SlotUnavailable);
    }

    let (end_time, overflow) = request
        .time
        .overflowing_add_signed(Duration::minutes(duration));
    if overflow != 0 {
        return Err(BookingError::InvalidRequest(
            "booking cannot run past midnight".to_string(),
        ));
    }

    store_booking(conn, request, end_time, duration)
}

/// Write half of [`create_booking`]: customer, conditional insert and line
/// items in one IMMEDIATE transaction.
fn store_booking(
    conn: &mut Connection,
    request: &BookingRequest,
    end_time: NaiveTime,
    duration: i64,
) -> Result<Booking, BookingError> {
    let name = request.name.trim();
    let phone = request.phone.trim();
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(anyhow::Error::from)?;

    let customer = queries::find_or_create_customer(
        &tx,
        name,
        phone,
        request.email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
    )?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: request.employee_id.clone(),
        customer_id: customer.id,
        date: request.date,
        start_time: request.time,
        end_time,
        status: BookingStatus::Confirmed,
        created_at: now,
        updated_at: now,
    };

    if !queries::insert_booking_if_free(&tx, &booking)? {
        tracing::warn!(
            employee_id = %booking.employee_id,
            date = %booking.date,
            start = %booking.start_time,
            "slot taken between availability check and insert"
        );
        // Dropping the transaction rolls back the customer insert too.
        return Err(BookingError::Conflict);
    }

    let lines: Vec<(String, u32)> = request
        .services
        .iter()
        .filter(|s| s.quantity > 0)
        .map(|s| (s.service_id.clone(), s.quantity))
        .collect();
    queries::insert_booking_lines(&tx, &booking.id, &lines)?;

    tx.commit().map_err(anyhow::Error::from)?;

    tracing::info!(
        booking_id = %booking.id,
        employee_id = %booking.employee_id,
        date = %booking.date,
        start = %booking.start_time,
        duration,
        "booking created"
    );

    Ok(booking)
}
