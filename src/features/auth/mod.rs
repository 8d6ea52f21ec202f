//! Visitor authentication.
//!
//! The backend owns accounts and issues a session cookie plus a CSRF token at
//! login. Those are kept server-side in the [`SessionStore`], keyed by the
//! portal's own session cookie, so the browser never handles them.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/auth/login` | Log in |
//! | POST | `/api/auth/register` | Create an account |
//! | POST | `/api/auth/logout` | Log out |
//! | GET | `/api/auth/me` | Current user |

pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod model;
pub mod routes;
pub mod services;

pub use services::{AuthService, SessionStore};
