pub mod booking_dto;

pub use booking_dto::*;
