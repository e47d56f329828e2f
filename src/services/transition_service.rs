//! Motor de transiciones de situación
//!
//! Valida una nueva situación contra el historial de odómetro y fechas del
//! vehículo y la confirma como una sola unidad atómica: lectura de odómetro,
//! fecha de situación, registro de situación y puntero del vehículo.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::models::{
    CommittedStatus, HistoryBaseline, NewOdometerReading, NewStatus, NewStatusDate, NewStatusRecord,
};
use crate::repositories::{
    OdometerRepository, StatusDateRepository, TransitionRepository, TransitionUnit, VehicleRepository,
};
use crate::services::transition_rules::{check_transition, validate_proposal};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::parse_vehicle_id;

pub struct TransitionService {
    vehicles: Arc<dyn VehicleRepository>,
    odometers: Arc<dyn OdometerRepository>,
    status_dates: Arc<dyn StatusDateRepository>,
    transitions: Arc<dyn TransitionRepository>,
    timeout: Duration,
}

impl TransitionService {
    pub fn new(
        vehicles: Arc<dyn VehicleRepository>,
        odometers: Arc<dyn OdometerRepository>,
        status_dates: Arc<dyn StatusDateRepository>,
        transitions: Arc<dyn TransitionRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            vehicles,
            odometers,
            status_dates,
            transitions,
            timeout,
        }
    }

    /// Proponer una nueva situación para el vehículo.
    ///
    /// Los rechazos de negocio (`InvalidInput`, `NotFound`, `Conflict`,
    /// `InvalidOdometer`) se devuelven tal cual. Cualquier fallo de la fase
    /// de escritura, incluido el timeout, aborta la unidad y se devuelve como
    /// `TransitionFailed`; la causa solo queda en el log.
    pub async fn propose(
        &self,
        vehicle_id: &str,
        acting_user_id: i64,
        new_status: NewStatus,
    ) -> AppResult<CommittedStatus> {
        let vehicle_id = parse_vehicle_id(vehicle_id)?;
        validate_proposal(&new_status)?;

        let (vehicle, latest_odometer, latest_date) = tokio::try_join!(
            self.vehicles.find_by_id(vehicle_id),
            self.odometers.find_latest_by_vehicle(vehicle_id),
            self.status_dates.find_latest_by_vehicle(vehicle_id),
        )?;

        let vehicle = vehicle.ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;
        let baseline = HistoryBaseline::from_latest(latest_odometer.as_ref(), latest_date.as_ref());

        if let Err(rejection) = check_transition(&vehicle, &baseline, &new_status) {
            warn!("⚠️ Transición rechazada para vehículo {}: {}", vehicle_id, rejection);
            return Err(rejection);
        }

        let outcome = tokio::time::timeout(
            self.timeout,
            self.commit_transition(vehicle_id, acting_user_id, &new_status),
        )
        .await;

        match outcome {
            Ok(Ok(committed)) => {
                info!(
                    "✅ Vehículo {} -> situación {} (km {}, fecha {}) registrada por usuario {}",
                    vehicle_id, committed.status_type_id, committed.km, committed.effective_date, acting_user_id
                );
                Ok(committed)
            }
            Ok(Err(rejection)) if rejection.is_rejection() => {
                warn!("⚠️ Transición rechazada bajo lock para vehículo {}: {}", vehicle_id, rejection);
                Err(rejection)
            }
            Ok(Err(cause)) => {
                error!("❌ Falló la transición del vehículo {}: {}", vehicle_id, cause);
                Err(AppError::TransitionFailed)
            }
            Err(_) => {
                error!(
                    "❌ Transición del vehículo {} excedió {:?}; unidad abortada",
                    vehicle_id, self.timeout
                );
                Err(AppError::TransitionFailed)
            }
        }
    }

    async fn commit_transition(
        &self,
        vehicle_id: i64,
        acting_user_id: i64,
        new_status: &NewStatus,
    ) -> AppResult<CommittedStatus> {
        let mut unit = self.transitions.begin().await?;

        match apply_transition(unit.as_mut(), vehicle_id, acting_user_id, new_status).await {
            Ok(committed) => {
                unit.commit().await?;
                Ok(committed)
            }
            Err(e) => {
                if let Err(rollback_error) = unit.rollback().await {
                    warn!("⚠️ Error en rollback del vehículo {}: {}", vehicle_id, rollback_error);
                }
                Err(e)
            }
        }
    }
}

async fn apply_transition(
    unit: &mut dyn TransitionUnit,
    vehicle_id: i64,
    acting_user_id: i64,
    new_status: &NewStatus,
) -> AppResult<CommittedStatus> {
    let vehicle = unit
        .lock_vehicle(vehicle_id)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

    // Releer bajo el lock: otra transición pudo confirmar desde la lectura previa
    let latest_odometer = unit.latest_odometer(vehicle_id).await?;
    let latest_date = unit.latest_status_date(vehicle_id).await?;
    let baseline = HistoryBaseline::from_latest(latest_odometer.as_ref(), latest_date.as_ref());
    check_transition(&vehicle, &baseline, new_status)?;

    let odometer = unit
        .insert_odometer_reading(NewOdometerReading {
            vehicle_id,
            km: new_status.km,
            created_by: acting_user_id,
        })
        .await?;

    let status_date = unit
        .insert_status_date(NewStatusDate {
            vehicle_id,
            effective_date: new_status.effective_date,
            created_by: acting_user_id,
        })
        .await?;

    let record = unit
        .insert_status(NewStatusRecord {
            vehicle_id,
            status_type_id: new_status.status_type_id,
            odometer_reading_id: odometer.id,
            status_date_id: status_date.id,
            effective_date: status_date.effective_date,
            observation: new_status.observation.clone(),
            created_by: acting_user_id,
        })
        .await?;

    unit.update_vehicle_status_type(vehicle_id, new_status.status_type_id)
        .await?;

    Ok(CommittedStatus::compose(record, &odometer, &status_date))
}
