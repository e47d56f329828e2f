//! Middleware del sistema
//!
//! Este módulo contiene la identificación del usuario y CORS.

pub mod auth;
pub mod cors;

pub use auth::ActingUser;
pub use cors::cors_layer;
