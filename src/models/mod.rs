pub mod booking;
pub mod customer;
pub mod employee;
pub mod schedule;
pub mod service;
pub mod time;

pub use booking::{Booking, BookingLine, BookingStatus};
pub use customer::Customer;
pub use employee::Employee;
pub use schedule::{TimeOff, WeeklyScheduleEntry};
pub use service::{Service, ServiceSelection};
