pub mod admin;
pub mod health;
pub mod public;
pub mod reminders;
pub mod webhook;
