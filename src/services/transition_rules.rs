//! Reglas de validación de una transición de situación
//!
//! Funciones puras sobre el vehículo, su línea base de historial y la
//! situación propuesta. El motor las evalúa dos veces: contra una lectura
//! previa sin lock y, de forma definitiva, dentro de la unidad atómica.

use crate::models::{HistoryBaseline, NewStatus, Vehicle};
use crate::utils::errors::{AppError, AppResult, OdometerViolation};
use crate::utils::validation::{validate_observation, MAX_OBSERVATION_LENGTH};

/// Validar la forma de la propuesta, independiente del historial
pub fn validate_proposal(proposal: &NewStatus) -> AppResult<()> {
    if proposal.km < 0 {
        return Err(AppError::InvalidInput(format!(
            "odometer value must be non-negative (got {})",
            proposal.km
        )));
    }
    if let Some(observation) = &proposal.observation {
        if validate_observation(observation).is_err() {
            return Err(AppError::InvalidInput(format!(
                "observation must be at most {} characters",
                MAX_OBSERVATION_LENGTH
            )));
        }
    }
    Ok(())
}

/// Evaluar las reglas de negocio en orden: situación repetida,
/// km de fecha pasada y km decreciente
pub fn check_transition(vehicle: &Vehicle, baseline: &HistoryBaseline, proposal: &NewStatus) -> AppResult<()> {
    if vehicle.is_in_status(proposal.status_type_id) {
        return Err(AppError::Conflict(format!(
            "status already set: vehicle {} is already in status type {}",
            vehicle.id, proposal.status_type_id
        )));
    }

    if proposal.effective_date < baseline.effective_date && proposal.km > baseline.km {
        return Err(AppError::InvalidOdometer(OdometerViolation::BackfillExceedsCurrent {
            proposed: proposal.km,
            current: baseline.km,
        }));
    }

    if proposal.km < baseline.km {
        return Err(AppError::InvalidOdometer(OdometerViolation::Decrease {
            proposed: proposal.km,
            current: baseline.km,
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn vehicle(status_type_id: Option<i64>) -> Vehicle {
        Vehicle {
            id: 1,
            license_plate: "ABC1D23".to_string(),
            status_type_id,
            created_at: Utc::now(),
        }
    }

    fn proposal(status_type_id: i64, effective_date: NaiveDate, km: i64) -> NewStatus {
        NewStatus {
            status_type_id,
            effective_date,
            km,
            observation: None,
        }
    }

    fn baseline(km: i64, effective_date: NaiveDate) -> HistoryBaseline {
        HistoryBaseline { km, effective_date }
    }

    #[test]
    fn test_first_transition_accepts_any_date_and_km() {
        let baseline = HistoryBaseline::default();
        for (d, km) in [(date(1990, 1, 1), 0), (date(2024, 1, 10), 1000), (date(2100, 12, 31), i64::MAX)] {
            assert!(check_transition(&vehicle(None), &baseline, &proposal(2, d, km)).is_ok());
        }
    }

    #[test]
    fn test_same_status_is_conflict_regardless_of_values() {
        let baseline = baseline(1000, date(2024, 1, 10));
        for (d, km) in [(date(2024, 1, 5), 1500), (date(2024, 1, 15), 900), (date(2024, 2, 1), 2000)] {
            let result = check_transition(&vehicle(Some(2)), &baseline, &proposal(2, d, km));
            assert!(matches!(result, Err(AppError::Conflict(_))));
        }
    }

    #[test]
    fn test_backfill_with_higher_km_is_rejected() {
        let result = check_transition(
            &vehicle(Some(2)),
            &baseline(1000, date(2024, 1, 10)),
            &proposal(3, date(2024, 1, 5), 1500),
        );
        assert!(matches!(
            result,
            Err(AppError::InvalidOdometer(OdometerViolation::BackfillExceedsCurrent {
                proposed: 1500,
                current: 1000
            }))
        ));
    }

    #[test]
    fn test_backfill_with_lower_km_reports_decrease() {
        let result = check_transition(
            &vehicle(Some(2)),
            &baseline(1000, date(2024, 1, 10)),
            &proposal(3, date(2024, 1, 5), 800),
        );
        assert!(matches!(
            result,
            Err(AppError::InvalidOdometer(OdometerViolation::Decrease { .. }))
        ));
    }

    #[test]
    fn test_backfill_with_equal_km_is_accepted() {
        let result = check_transition(
            &vehicle(Some(2)),
            &baseline(1000, date(2024, 1, 10)),
            &proposal(3, date(2024, 1, 5), 1000),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_future_date_with_lower_km_is_rejected() {
        let result = check_transition(
            &vehicle(Some(2)),
            &baseline(1000, date(2024, 1, 10)),
            &proposal(3, date(2024, 1, 15), 900),
        );
        assert!(matches!(
            result,
            Err(AppError::InvalidOdometer(OdometerViolation::Decrease {
                proposed: 900,
                current: 1000
            }))
        ));
    }

    #[test]
    fn test_same_date_only_needs_monotonic_km() {
        let baseline = baseline(1000, date(2024, 1, 10));
        assert!(check_transition(&vehicle(Some(2)), &baseline, &proposal(3, date(2024, 1, 10), 1200)).is_ok());
        assert!(check_transition(&vehicle(Some(2)), &baseline, &proposal(3, date(2024, 1, 10), 999)).is_err());
    }

    #[test]
    fn test_validate_proposal() {
        assert!(validate_proposal(&proposal(1, date(2024, 1, 1), 0)).is_ok());
        assert!(matches!(
            validate_proposal(&proposal(1, date(2024, 1, 1), -1)),
            Err(AppError::InvalidInput(_))
        ));

        let mut long = proposal(1, date(2024, 1, 1), 10);
        long.observation = Some("x".repeat(MAX_OBSERVATION_LENGTH + 1));
        assert!(matches!(validate_proposal(&long), Err(AppError::InvalidInput(_))));
    }
}
