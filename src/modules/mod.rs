//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the gateway to the consular backend API.

pub mod backend;
