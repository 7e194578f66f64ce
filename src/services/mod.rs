//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the login flow and persistence concerns so route
//! handlers can stay focused on cookies, redirects and status codes.

pub mod auth;
pub mod google;
pub mod session;
pub mod users;
