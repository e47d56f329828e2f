//! Modelos del historial de situaciones
//!
//! Lecturas de odómetro, fechas de situación y registros de situación son
//! hechos históricos inmutables: se crean una vez por transición y nunca
//! se actualizan.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tipo de situación (datos de referencia)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StatusType {
    pub id: i64,
    pub name: String,
    pub specification: Option<String>,
}

/// Lectura de odómetro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OdometerReading {
    pub id: i64,
    pub vehicle_id: i64,
    pub km: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Fecha efectiva de una situación
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StatusDate {
    pub id: i64,
    pub vehicle_id: i64,
    pub effective_date: NaiveDate,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Registro del historial: "el vehículo X estaba en la situación Y
/// desde la fecha D con el odómetro K"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StatusRecord {
    pub id: i64,
    pub vehicle_id: i64,
    pub status_type_id: i64,
    pub odometer_reading_id: i64,
    pub status_date_id: i64,
    pub effective_date: NaiveDate,
    pub observation: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Datos para insertar una lectura de odómetro
#[derive(Debug, Clone)]
pub struct NewOdometerReading {
    pub vehicle_id: i64,
    pub km: i64,
    pub created_by: i64,
}

/// Datos para insertar una fecha de situación
#[derive(Debug, Clone)]
pub struct NewStatusDate {
    pub vehicle_id: i64,
    pub effective_date: NaiveDate,
    pub created_by: i64,
}

/// Datos para insertar un registro de situación
#[derive(Debug, Clone)]
pub struct NewStatusRecord {
    pub vehicle_id: i64,
    pub status_type_id: i64,
    pub odometer_reading_id: i64,
    pub status_date_id: i64,
    pub effective_date: NaiveDate,
    pub observation: Option<String>,
    pub created_by: i64,
}

/// Situación propuesta para un vehículo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStatus {
    pub status_type_id: i64,
    pub effective_date: NaiveDate,
    pub km: i64,
    pub observation: Option<String>,
}

/// Último km y última fecha conocidos de un vehículo.
///
/// Sin historial se usa la línea base: km 0 y `NaiveDate::MIN`, de modo
/// que la primera transición acepta cualquier km no negativo y cualquier fecha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryBaseline {
    pub km: i64,
    pub effective_date: NaiveDate,
}

impl Default for HistoryBaseline {
    fn default() -> Self {
        Self {
            km: 0,
            effective_date: NaiveDate::MIN,
        }
    }
}

impl HistoryBaseline {
    pub fn from_latest(odometer: Option<&OdometerReading>, date: Option<&StatusDate>) -> Self {
        let baseline = Self::default();
        Self {
            km: odometer.map_or(baseline.km, |reading| reading.km),
            effective_date: date.map_or(baseline.effective_date, |d| d.effective_date),
        }
    }
}

/// Situación confirmada: el registro creado más el km y la fecha
/// efectivamente persistidos en la misma unidad atómica
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedStatus {
    pub id: i64,
    pub vehicle_id: i64,
    pub status_type_id: i64,
    pub odometer_reading_id: i64,
    pub status_date_id: i64,
    pub observation: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub km: i64,
    pub effective_date: NaiveDate,
}

impl CommittedStatus {
    pub fn compose(record: StatusRecord, odometer: &OdometerReading, date: &StatusDate) -> Self {
        Self {
            id: record.id,
            vehicle_id: record.vehicle_id,
            status_type_id: record.status_type_id,
            odometer_reading_id: record.odometer_reading_id,
            status_date_id: record.status_date_id,
            observation: record.observation,
            created_by: record.created_by,
            created_at: record.created_at,
            km: odometer.km,
            effective_date: date.effective_date,
        }
    }
}

/// Fila del historial ya unida con su tipo y su lectura de odómetro
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StatusHistoryRow {
    pub id: i64,
    pub status_type_name: String,
    pub status_type_specification: Option<String>,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub effective_date: NaiveDate,
    /// `None` si la lectura referenciada no existe
    pub km: Option<i64>,
}

/// Página del historial de un vehículo
#[derive(Debug, Clone, PartialEq)]
pub struct StatusHistoryPage {
    pub total: i64,
    pub rows: Vec<StatusHistoryRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_without_history() {
        let baseline = HistoryBaseline::from_latest(None, None);
        assert_eq!(baseline.km, 0);
        assert_eq!(baseline.effective_date, NaiveDate::MIN);
    }

    #[test]
    fn test_baseline_from_latest_records() {
        let reading = OdometerReading {
            id: 3,
            vehicle_id: 1,
            km: 1200,
            created_by: 7,
            created_at: Utc::now(),
        };
        let date = StatusDate {
            id: 4,
            vehicle_id: 1,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            created_by: 7,
            created_at: Utc::now(),
        };
        let baseline = HistoryBaseline::from_latest(Some(&reading), Some(&date));
        assert_eq!(baseline.km, 1200);
        assert_eq!(baseline.effective_date, date.effective_date);
    }
}
