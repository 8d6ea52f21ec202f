pub mod admin_handlers;
pub mod resource_handlers;

pub use admin_handlers::*;
