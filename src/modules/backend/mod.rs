//! Gateway to the consular backend API.
//!
//! All business rules and persistence live behind this API. The client injects
//! the visitor's cookies and CSRF token, unwraps the `{success, data, error}`
//! envelope and hands typed values to the features.

mod admin;
mod applications;
mod auth;
mod booking;
mod client;
pub mod envelope;
mod models;

pub use applications::{DocumentUpload, PassportExtraction};
pub use auth::LoginOutcome;
pub use booking::BookingBackend;
pub use client::{
    BackendClient, BackendCredentials, BackendSession, DownloadedFile, SharedCredentials,
    CSRF_COOKIE, CSRF_HEADER,
};
pub use models::*;
