//! Modelo de Vehicle
//!
//! Mapea la tabla `vehicles`. El puntero `status_type_id` solo lo modifica
//! el motor de transiciones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Vehicle principal - mapea la tabla vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: String,
    /// Situación actual; `None` mientras el vehículo no tenga historial
    pub status_type_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_in_status(&self, status_type_id: i64) -> bool {
        self.status_type_id == Some(status_type_id)
    }
}
