//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! de parámetros y JWT.

pub mod errors;
pub mod jwt;
pub mod validation;
