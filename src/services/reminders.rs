//! Pre-appointment reminders and post-appointment follow-ups.
//!
//! Meant to be triggered about once a minute. Each notice is claimed with a
//! conditional status update before the text goes out, so overlapping runs
//! never message the same customer twice.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::queries;
use crate::models::{Booking, BookingStatus};
use crate::services::clock::BusinessClock;
use crate::services::notifications::{followup_message, reminder_message};
use crate::state::AppState;

/// Reminders go out when the start is strictly inside this many minutes ahead.
pub const REMINDER_WINDOW_MINUTES: (i64, i64) = (59, 61);
/// Follow-ups go out when the end is strictly inside this many minutes behind.
pub const FOLLOWUP_WINDOW_MINUTES: (i64, i64) = (4, 6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Reminder,
    FollowUp,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub reminders_sent: usize,
    pub followups_sent: usize,
    pub failures: usize,
}

fn strictly_within(seconds: i64, (low, high): (i64, i64)) -> bool {
    seconds > low * 60 && seconds < high * 60
}

/// Which notice, if any, `booking` is due for at `now`.
pub fn notice_due(
    booking: &Booking,
    clock: &BusinessClock,
    now: DateTime<Utc>,
) -> Option<NoticeKind> {
    match booking.status {
        BookingStatus::Confirmed => {
            let start = clock.localize(booking.date, booking.start_time)?;
            strictly_within((start - now).num_seconds(), REMINDER_WINDOW_MINUTES)
                .then_some(NoticeKind::Reminder)
        }
        BookingStatus::ReminderSent => {
            let end = clock.localize(booking.date, booking.end_time)?;
            strictly_within((now - end).num_seconds(), FOLLOWUP_WINDOW_MINUTES)
                .then_some(NoticeKind::FollowUp)
        }
        _ => None,
    }
}

pub async fn run_due_notices(state: &AppState) -> anyhow::Result<ReminderReport> {
    let now = state.clock.now_utc();
    let candidates = {
        let db = state.lock_db()?;
        // both windows are within a day of now, whatever side of midnight
        let today = state.clock.today();
        queries::bookings_with_status_between(
            &db,
            &[BookingStatus::Confirmed, BookingStatus::ReminderSent],
            today - Duration::days(1),
            today + Duration::days(1),
        )?
    };

    let mut report = ReminderReport::default();
    for booking in candidates {
        let Some(kind) = notice_due(&booking, &state.clock, now) else {
            continue;
        };

        let customer = {
            let db = state.lock_db()?;
            queries::get_customer(&db, &booking.customer_id)?
        };
        let Some(customer) = customer.filter(|c| !c.phone.trim().is_empty()) else {
            tracing::warn!(
                booking_id = %booking.id,
                "no customer phone for booking, skipping notice"
            );
            report.failures += 1;
            continue;
        };

        let (claimed_from, claimed_as, body) = match kind {
            NoticeKind::Reminder => (
                BookingStatus::Confirmed,
                BookingStatus::ReminderSent,
                reminder_message(&customer.name, &state.config.business_name),
            ),
            NoticeKind::FollowUp => (
                BookingStatus::ReminderSent,
                BookingStatus::FollowupInProgress,
                followup_message(
                    &customer.name,
                    &state.config.business_name,
                    &state.config.review_link,
                ),
            ),
        };

        let claimed = {
            let db = state.lock_db()?;
            queries::transition_booking_status(&db, &booking.id, &[claimed_from], claimed_as)?
        };
        if !claimed {
            tracing::info!(booking_id = %booking.id, ?kind, "notice already claimed");
            continue;
        }

        match state.messaging.send_message(&customer.phone, &body).await {
            Ok(()) => {
                let db = state.lock_db()?;
                match kind {
                    NoticeKind::Reminder => report.reminders_sent += 1,
                    NoticeKind::FollowUp => {
                        queries::transition_booking_status(
                            &db,
                            &booking.id,
                            &[BookingStatus::FollowupInProgress],
                            BookingStatus::Completed,
                        )?;
                        report.followups_sent += 1;
                    }
                }
                tracing::info!(booking_id = %booking.id, ?kind, "notice sent");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    booking_id = %booking.id,
                    ?kind,
                    "failed to send notice"
                );
                report.failures += 1;
                let db = state.lock_db()?;
                queries::transition_booking_status(&db, &booking.id, &[claimed_as], claimed_from)?;
            }
        }
    }

    Ok(report)
}
