pub mod availability;
pub mod booking;
pub mod calendar;
pub mod clock;
pub mod commands;
pub mod messaging;
pub mod notifications;
pub mod reminders;
