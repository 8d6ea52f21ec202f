//! Appointment booking.
//!
//! A seven-step wizard (service, center, applicant details, applicant count,
//! date and time, review, confirmation) kept server-side, one per portal
//! session. See [`wizard`] for the state machine.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod wizard;

pub use services::BookingService;
