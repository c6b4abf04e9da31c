//! Keyword commands sent to the business number by SMS.

use chrono::{DateTime, Utc};

use crate::db::queries;
use crate::models::time::{format_date, format_time};
use crate::models::{Booking, BookingStatus};
use crate::services::clock::BusinessClock;
use crate::state::AppState;

/// Bookings starting within this many seconds can no longer be cancelled by text.
pub const CANCEL_CUTOFF_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundCommand {
    Schedule,
    CancelBooking,
    Unrecognized,
}

impl InboundCommand {
    pub fn parse(body: &str) -> Self {
        match body.trim().to_uppercase().as_str() {
            "SCHEDULE" => InboundCommand::Schedule,
            "CANCELBOOKING" | "CANCEL" => InboundCommand::CancelBooking,
            _ => InboundCommand::Unrecognized,
        }
    }
}

pub const UNRECOGNIZED_REPLY: &str =
    "Unrecognized command. Reply with SCHEDULE (barbers) or CANCELBOOKING (customers).";

/// `entries` are (start, customer name) pairs, already in order.
pub fn schedule_reply(entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return "You have no bookings today.".to_string();
    }
    let mut reply = String::from("Today's bookings:");
    for (start, name) in entries {
        reply.push_str(&format!("\n• {start} - {name}"));
    }
    reply
}

#[derive(Debug, Default)]
pub struct CancellationPlan {
    pub cancellable: Vec<Booking>,
    pub too_late: Vec<Booking>,
}

/// Splits upcoming bookings by whether they are still far enough away to
/// cancel. Bookings that already started are left out entirely.
pub fn plan_cancellation(
    bookings: Vec<Booking>,
    clock: &BusinessClock,
    now: DateTime<Utc>,
) -> CancellationPlan {
    let mut plan = CancellationPlan::default();
    for booking in bookings {
        let Some(start) = clock.localize(booking.date, booking.start_time) else {
            continue;
        };
        let until = (start - now).num_seconds();
        if until > CANCEL_CUTOFF_SECONDS {
            plan.cancellable.push(booking);
        } else if until > 0 {
            plan.too_late.push(booking);
        }
    }
    plan
}

pub fn cancel_reply(cancelled: &[Booking], too_late: usize, business_phone: &str) -> String {
    if !cancelled.is_empty() {
        let mut reply = String::from("Cancelled the following bookings:");
        for b in cancelled {
            reply.push_str(&format!(
                "\n• {} at {}",
                format_date(b.date),
                format_time(b.start_time)
            ));
        }
        return reply;
    }
    if too_late > 0 {
        return format!(
            "This appointment is too close to cancel. Please call us to make changes at {business_phone}"
        );
    }
    "You have no upcoming bookings that can be cancelled.".to_string()
}

/// Reply text for an inbound message from `from`.
pub fn reply_to(state: &AppState, from: &str, body: &str) -> anyhow::Result<String> {
    let from = from.trim();
    match InboundCommand::parse(body) {
        InboundCommand::Schedule => schedule_for(state, from),
        InboundCommand::CancelBooking => cancel_for(state, from),
        InboundCommand::Unrecognized => Ok(UNRECOGNIZED_REPLY.to_string()),
    }
}

fn schedule_for(state: &AppState, from: &str) -> anyhow::Result<String> {
    let db = state.lock_db()?;
    let Some(barber) = queries::get_employee_by_phone(&db, from)? else {
        return Ok("We couldn't find a barber account for your number.".to_string());
    };

    let today = state.clock.today();
    let mut entries = vec![];
    for booking in queries::bookings_for_employee_on(&db, &barber.id, today)? {
        if !BookingStatus::UPCOMING.contains(&booking.status) {
            continue;
        }
        let name = queries::get_customer(&db, &booking.customer_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| "Unknown".to_string());
        entries.push((format_time(booking.start_time), name));
    }

    tracing::info!(employee_id = %barber.id, count = entries.len(), "schedule requested by sms");
    Ok(schedule_reply(&entries))
}

fn cancel_for(state: &AppState, from: &str) -> anyhow::Result<String> {
    let db = state.lock_db()?;
    let Some(customer) = queries::get_customer_by_phone(&db, from)? else {
        return Ok("We couldn't find any bookings for your number.".to_string());
    };

    let upcoming = queries::bookings_for_customer(&db, &customer.id, &BookingStatus::UPCOMING)?;
    let plan = plan_cancellation(upcoming, &state.clock, state.clock.now_utc());

    let mut cancelled = vec![];
    for booking in plan.cancellable {
        if queries::transition_booking_status(
            &db,
            &booking.id,
            &BookingStatus::CANCELLABLE,
            BookingStatus::Cancelled,
        )? {
            tracing::info!(booking_id = %booking.id, "booking cancelled by sms");
            cancelled.push(booking);
        }
    }

    Ok(cancel_reply(
        &cancelled,
        plan.too_late.len(),
        &state.config.business_phone,
    ))
}
