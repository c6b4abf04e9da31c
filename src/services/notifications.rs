//! Booking confirmation texts and the message templates shared with the
//! reminder job.

use chrono::{NaiveDate, NaiveTime};

use crate::db::queries;
use crate::models::time::{format_date, format_time};
use crate::models::BookingLine;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} phone missing")]
    MissingPhone(&'static str),

    #[error("failed to send SMS: {0}")]
    Send(anyhow::Error),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ConfirmationReport {
    pub customer_notified: bool,
    pub barber_notified: bool,
}

pub fn customer_confirmation(
    business: &str,
    customer_name: &str,
    date: NaiveDate,
    start: NaiveTime,
    barber_name: &str,
) -> String {
    format!(
        "Hi {customer_name}, your booking at {business} is confirmed for {} at {} with {barber_name}. See you soon!",
        format_date(date),
        format_time(start),
    )
}

pub fn barber_notification(
    customer_name: &str,
    lines: &[BookingLine],
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> String {
    let services = if lines.is_empty() {
        "N/A".to_string()
    } else {
        lines
            .iter()
            .map(|l| match l.quantity {
                1 => l.service_name.clone(),
                n => format!("{} x{n}", l.service_name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "New booking: {customer_name}\nServices: {services}\nTime: {} {} - {}",
        format_date(date),
        format_time(start),
        format_time(end),
    )
}

pub fn reminder_message(customer_name: &str, business: &str) -> String {
    format!("Hi {customer_name}, your booking at {business} is in 1 hour!")
}

pub fn followup_message(customer_name: &str, business: &str, review_link: &str) -> String {
    let mut message = format!(
        "Thank you for choosing {business}, {customer_name}! We hope you enjoyed your visit."
    );
    if !review_link.is_empty() {
        message.push_str(&format!(" Please leave us a review: {review_link}"));
    }
    message
}

/// Texts the customer (required) and the barber (when they have a phone).
pub async fn send_booking_confirmation(
    state: &AppState,
    booking_id: &str,
) -> Result<ConfirmationReport, NotifyError> {
    let (booking, customer, barber, lines) = {
        let db = state.lock_db()?;
        let booking =
            queries::get_booking(&db, booking_id)?.ok_or(NotifyError::NotFound("booking"))?;
        let customer = queries::get_customer(&db, &booking.customer_id)?
            .ok_or(NotifyError::NotFound("customer"))?;
        let barber = queries::get_employee(&db, &booking.employee_id)?
            .ok_or(NotifyError::NotFound("barber"))?;
        let lines = queries::get_booking_lines(&db, &booking.id)?;
        (booking, customer, barber, lines)
    };

    if customer.phone.trim().is_empty() {
        return Err(NotifyError::MissingPhone("customer"));
    }

    let customer_msg = customer_confirmation(
        &state.config.business_name,
        &customer.name,
        booking.date,
        booking.start_time,
        &barber.name,
    );
    state
        .messaging
        .send_message(&customer.phone, &customer_msg)
        .await
        .map_err(NotifyError::Send)?;

    let barber_notified = match barber.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(phone) => {
            let barber_msg = barber_notification(
                &customer.name,
                &lines,
                booking.date,
                booking.start_time,
                booking.end_time,
            );
            match state.messaging.send_message(phone, &barber_msg).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        booking_id = %booking.id,
                        "failed to notify barber"
                    );
                    false
                }
            }
        }
        None => {
            tracing::warn!(employee_id = %barber.id, "barber has no phone, skipping notification");
            false
        }
    };

    Ok(ConfirmationReport {
        customer_notified: true,
        barber_notified,
    })
}
