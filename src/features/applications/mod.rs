//! Miscellaneous applications: multipart submission with documents, status
//! tracking, filled-PDF and document downloads, and passport OCR.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::ApplicationsService;
