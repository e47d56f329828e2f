use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{NewStatus, StatusHistoryRow};
use crate::utils::validation::validate_observation;

// Request para registrar una nueva situación
#[derive(Debug, Deserialize, Validate)]
pub struct ProposeStatusRequest {
    #[validate(range(min = 1))]
    pub status_type_id: i64,

    pub effective_date: NaiveDate,

    #[validate(range(min = 0))]
    pub km: i64,

    #[validate(custom = "validate_observation")]
    pub observation: Option<String>,
}

impl From<ProposeStatusRequest> for NewStatus {
    fn from(request: ProposeStatusRequest) -> Self {
        Self {
            status_type_id: request.status_type_id,
            effective_date: request.effective_date,
            km: request.km,
            observation: request.observation,
        }
    }
}

// Parámetros crudos del historial; se validan en el servicio
#[derive(Debug, Default, Deserialize)]
pub struct StatusHistoryQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

// Entrada del historial
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub effective_date: NaiveDate,
    pub km: i64,
}

impl From<StatusHistoryRow> for StatusHistoryEntry {
    fn from(row: StatusHistoryRow) -> Self {
        Self {
            id: row.id,
            name: row.status_type_name,
            reason: row.status_type_specification.filter(|reason| !reason.is_empty()),
            observation: row.observation,
            created_at: row.created_at,
            effective_date: row.effective_date,
            km: row.km.unwrap_or(0),
        }
    }
}

// Response del historial
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusHistoryResponse {
    pub total: i64,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub statuses: Vec<StatusHistoryEntry>,
}

// Response genérica
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}
