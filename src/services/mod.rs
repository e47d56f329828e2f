//! Servicios del dominio
//!
//! Motor de transiciones, sus reglas y la consulta del historial.

pub mod status_query_service;
pub mod transition_rules;
pub mod transition_service;

pub use status_query_service::{HistoryRequest, StatusQueryService};
pub use transition_service::TransitionService;
