//! Utilidades de validación
//!
//! Funciones helper para validar y convertir los parámetros crudos
//! que llegan desde la capa de transporte.

use validator::ValidationError;

use crate::utils::errors::{invalid_input_error, AppResult};

/// Longitud máxima de la observación de una situación
pub const MAX_OBSERVATION_LENGTH: usize = 500;

/// Convertir el id de vehículo recibido como texto a entero no negativo
pub fn parse_vehicle_id(value: &str) -> AppResult<i64> {
    match value.trim().parse::<i64>() {
        Ok(id) if id >= 0 => Ok(id),
        _ => Err(invalid_input_error(&format!("invalid vehicle id '{}'", value))),
    }
}

/// Convertir un parámetro de paginación opcional; `None` si no fue enviado
pub fn parse_page_param(name: &str, value: Option<&str>) -> AppResult<Option<u32>> {
    let Some(raw) = value else {
        return Ok(None);
    };

    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(invalid_input_error(&format!(
            "invalid {} '{}': expected an integer >= 1",
            name, raw
        ))),
    }
}

/// Validar que la observación no exceda el máximo permitido
pub fn validate_observation(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_OBSERVATION_LENGTH {
        let mut error = ValidationError::new("length");
        error.add_param("max".into(), &MAX_OBSERVATION_LENGTH);
        error.add_param("actual".into(), &len);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vehicle_id() {
        assert_eq!(parse_vehicle_id("1").unwrap(), 1);
        assert_eq!(parse_vehicle_id(" 42 ").unwrap(), 42);
        assert_eq!(parse_vehicle_id("0").unwrap(), 0);
        assert!(parse_vehicle_id("abc").is_err());
        assert!(parse_vehicle_id("-3").is_err());
        assert!(parse_vehicle_id("").is_err());
    }

    #[test]
    fn test_parse_page_param() {
        assert_eq!(parse_page_param("page", None).unwrap(), None);
        assert_eq!(parse_page_param("page", Some("2")).unwrap(), Some(2));
        assert!(parse_page_param("page", Some("0")).is_err());
        assert!(parse_page_param("per_page", Some("ten")).is_err());
    }

    #[test]
    fn test_validate_observation() {
        assert!(validate_observation("pneu furado").is_ok());
        assert!(validate_observation(&"a".repeat(MAX_OBSERVATION_LENGTH)).is_ok());
        assert!(validate_observation(&"a".repeat(MAX_OBSERVATION_LENGTH + 1)).is_err());
    }
}
