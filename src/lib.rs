//! Situación de vehículos de la flota
//!
//! Registra los cambios de situación de cada vehículo anclados a una lectura
//! de odómetro y a una fecha efectiva, con validación contra el historial y
//! escritura atómica.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
