use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::time::hhmm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub employee_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    ReminderSent,
    FollowupInProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses whose bookings hold their time range against new bookings.
    pub const OCCUPYING: [BookingStatus; 4] = [
        BookingStatus::Confirmed,
        BookingStatus::ReminderSent,
        BookingStatus::FollowupInProgress,
        BookingStatus::Completed,
    ];

    /// Statuses a booking can still be cancelled from.
    pub const CANCELLABLE: [BookingStatus; 3] = [
        BookingStatus::Confirmed,
        BookingStatus::ReminderSent,
        BookingStatus::FollowupInProgress,
    ];

    /// Statuses of bookings the customer is still expected to show up for.
    pub const UPCOMING: [BookingStatus; 2] =
        [BookingStatus::Confirmed, BookingStatus::ReminderSent];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::ReminderSent => "reminder_sent",
            BookingStatus::FollowupInProgress => "followup_in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_occupying(&self) -> bool {
        Self::OCCUPYING.contains(self)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "reminder_sent" => Ok(BookingStatus::ReminderSent),
            "followup_in_progress" => Ok(BookingStatus::FollowupInProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// One service line of a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingLine {
    pub service_id: String,
    pub service_name: String,
    pub quantity: u32,
}
