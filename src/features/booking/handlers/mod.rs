pub mod wizard_handler;

pub use wizard_handler::*;
