pub mod admin;
pub mod applications;
pub mod assistant;
pub mod auth;
pub mod booking;
pub mod catalog;
