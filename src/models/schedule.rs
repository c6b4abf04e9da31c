use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::time::hhmm;

/// Recurring working hours for one weekday (1 = Monday .. 7 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyScheduleEntry {
    pub employee_id: String,
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// A whole day off; overrides the weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOff {
    pub id: String,
    pub employee_id: String,
    pub date: NaiveDate,
    pub reason: Option<String>,
}
