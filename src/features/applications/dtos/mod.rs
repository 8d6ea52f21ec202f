pub mod applications_dto;

pub use applications_dto::*;
