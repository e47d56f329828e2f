//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del servicio
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Regla de kilometraje violada por una transición
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometerViolation {
    /// Transición con fecha pasada que declara más km que el último registro
    BackfillExceedsCurrent { proposed: i64, current: i64 },
    /// El odómetro propuesto es menor que el último registro
    Decrease { proposed: i64, current: i64 },
}

impl OdometerViolation {
    pub fn code(&self) -> &'static str {
        match self {
            OdometerViolation::BackfillExceedsCurrent { .. } => "BACKFILL_EXCEEDS_CURRENT_KM",
            OdometerViolation::Decrease { .. } => "ODOMETER_DECREASE",
        }
    }
}

impl std::fmt::Display for OdometerViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OdometerViolation::BackfillExceedsCurrent { proposed, current } => write!(
                f,
                "backfilled km exceeds current km (proposed {}, current {})",
                proposed, current
            ),
            OdometerViolation::Decrease { proposed, current } => write!(
                f,
                "odometer cannot decrease (proposed {}, current {})",
                proposed, current
            ),
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid odometer: {0}")]
    InvalidOdometer(OdometerViolation),

    #[error("Could not record vehicle status")]
    TransitionFailed,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errores de regla de negocio detectados antes de escribir.
    /// Atraviesan la unidad atómica sin convertirse en `TransitionFailed`.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::InvalidOdometer(_)
        )
    }

    /// Código estable legible por máquina
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidOdometer(violation) => violation.code(),
            AppError::TransitionFailed => "TRANSITION_FAILED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Database(_) => "DB_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidOdometer(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TransitionFailed | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let (error, message, details) = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    "Database Error",
                    "An error occurred while accessing the database".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                error!("❌ Internal error: {}", msg);
                (
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
            AppError::TransitionFailed => (
                "Transition Failed",
                AppError::TransitionFailed.to_string(),
                None,
            ),
            AppError::Validation(e) => {
                warn!("⚠️ Validation error: {}", e);
                (
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::InvalidInput(msg) => ("Invalid Input", msg, None),
            AppError::NotFound(msg) => ("Not Found", msg, None),
            AppError::Conflict(msg) => ("Conflict", msg, None),
            AppError::InvalidOdometer(violation) => ("Invalid Odometer", violation.to_string(), None),
            AppError::Unauthorized(msg) => ("Unauthorized", msg, None),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de entrada inválida
pub fn invalid_input_error(message: &str) -> AppError {
    AppError::InvalidInput(message.to_string())
}
