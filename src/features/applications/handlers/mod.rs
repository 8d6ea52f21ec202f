pub mod applications_handler;

pub use applications_handler::*;
