pub mod applications_service;

pub use applications_service::ApplicationsService;
