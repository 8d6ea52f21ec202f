pub mod auth_service;
pub mod session_store;

pub use auth_service::AuthService;
pub use session_store::SessionStore;
