//! Chat assistant that walks a visitor from a service to open appointment
//! times using a fixed decision tree.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod script;
pub mod services;

pub use services::AssistantService;
