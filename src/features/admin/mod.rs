//! Back office. Every table (services, service details, centers, counters,
//! time slots, applications, miscellaneous applications, appointments,
//! notification templates) is one [`resource::AdminResource`] served by the
//! same generic handlers. Time-slot bulk operations, document attachment and
//! template previews sit alongside.
//!
//! All endpoints require an `admin` or `super_admin` session.

pub mod dtos;
pub mod handlers;
pub mod resource;
pub mod routes;
pub mod services;
pub mod slots;

pub use services::AdminService;
