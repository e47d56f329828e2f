//! Store en memoria
//!
//! Implementa todos los repositorios y la unidad atómica sin base de datos.
//! Se usa en desarrollo cuando no hay DATABASE_URL y en los tests.
//!
//! - El lock de fila es un `tokio::sync::Mutex` por vehículo, retenido por la
//!   unidad hasta `commit`, `rollback` o drop.
//! - Las escrituras quedan en la unidad y se aplican bajo un único write lock
//!   de las tablas al confirmar, así ningún lector ve un estado parcial.
//! - Los ids salen de secuencias que no retroceden en rollback.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error};

use super::{
    HistoryWindow, OdometerRepository, StatusDateRepository, StatusHistoryRepository, TransitionRepository,
    TransitionUnit, VehicleRepository,
};
use crate::models::{
    NewOdometerReading, NewStatusDate, NewStatusRecord, OdometerReading, StatusDate, StatusHistoryPage,
    StatusHistoryRow, StatusRecord, StatusType, Vehicle,
};
use crate::utils::errors::{AppError, AppResult};

/// Paso de escritura donde se puede inyectar un fallo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    OdometerReading,
    StatusDate,
    Status,
    VehiclePointer,
    Commit,
}

#[derive(Default)]
struct MemoryTables {
    status_types: BTreeMap<i64, StatusType>,
    vehicles: BTreeMap<i64, Vehicle>,
    odometer_readings: Vec<OdometerReading>,
    status_dates: Vec<StatusDate>,
    statuses: Vec<StatusRecord>,
}

#[derive(Default)]
struct Sequences {
    status_types: AtomicI64,
    vehicles: AtomicI64,
    odometer_readings: AtomicI64,
    status_dates: AtomicI64,
    statuses: AtomicI64,
}

fn next_id(sequence: &AtomicI64) -> i64 {
    sequence.fetch_add(1, Ordering::SeqCst) + 1
}

#[derive(Default)]
struct MemoryInner {
    tables: RwLock<MemoryTables>,
    vehicle_locks: StdMutex<HashMap<i64, Arc<Mutex<()>>>>,
    sequences: Sequences,
    fault: StdMutex<Option<WriteStep>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar un tipo de situación
    pub async fn add_status_type(&self, name: &str, specification: Option<&str>) -> StatusType {
        let status_type = StatusType {
            id: next_id(&self.inner.sequences.status_types),
            name: name.to_string(),
            specification: specification.map(str::to_string),
        };
        let mut tables = self.inner.tables.write().await;
        tables.status_types.insert(status_type.id, status_type.clone());
        status_type
    }

    /// Registrar un vehículo sin historial
    pub async fn add_vehicle(&self, license_plate: &str) -> Vehicle {
        let vehicle = Vehicle {
            id: next_id(&self.inner.sequences.vehicles),
            license_plate: license_plate.to_string(),
            status_type_id: None,
            created_at: Utc::now(),
        };
        let mut tables = self.inner.tables.write().await;
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        vehicle
    }

    /// Hacer fallar la próxima escritura en `step`
    pub fn fail_on(&self, step: WriteStep) {
        *self.inner.fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(step);
    }

    pub async fn odometer_readings_for(&self, vehicle_id: i64) -> Vec<OdometerReading> {
        let tables = self.inner.tables.read().await;
        tables
            .odometer_readings
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }

    pub async fn status_dates_for(&self, vehicle_id: i64) -> Vec<StatusDate> {
        let tables = self.inner.tables.read().await;
        tables
            .status_dates
            .iter()
            .filter(|d| d.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }

    /// Registros de situación en orden de creación
    pub async fn statuses_for(&self, vehicle_id: i64) -> Vec<StatusRecord> {
        let tables = self.inner.tables.read().await;
        tables
            .statuses
            .iter()
            .filter(|s| s.vehicle_id == vehicle_id)
            .cloned()
            .collect()
    }

    fn take_fault(&self, step: WriteStep) -> AppResult<()> {
        let mut fault = self.inner.fault.lock().unwrap_or_else(|e| e.into_inner());
        if *fault == Some(step) {
            *fault = None;
            return Err(AppError::Internal(format!("injected write fault at {:?}", step)));
        }
        Ok(())
    }

    fn vehicle_lock(&self, id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.inner.vehicle_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }
}

fn latest_reading<'a>(readings: impl Iterator<Item = &'a OdometerReading>, vehicle_id: i64) -> Option<OdometerReading> {
    readings
        .filter(|r| r.vehicle_id == vehicle_id)
        .max_by_key(|r| r.id)
        .cloned()
}

fn latest_date<'a>(dates: impl Iterator<Item = &'a StatusDate>, vehicle_id: i64) -> Option<StatusDate> {
    dates
        .filter(|d| d.vehicle_id == vehicle_id)
        .max_by_key(|d| (d.effective_date, d.id))
        .cloned()
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Vehicle>> {
        Ok(self.inner.tables.read().await.vehicles.get(&id).cloned())
    }
}

#[async_trait]
impl OdometerRepository for MemoryStore {
    async fn find_latest_by_vehicle(&self, vehicle_id: i64) -> AppResult<Option<OdometerReading>> {
        let tables = self.inner.tables.read().await;
        Ok(latest_reading(tables.odometer_readings.iter(), vehicle_id))
    }
}

#[async_trait]
impl StatusDateRepository for MemoryStore {
    async fn find_latest_by_vehicle(&self, vehicle_id: i64) -> AppResult<Option<StatusDate>> {
        let tables = self.inner.tables.read().await;
        Ok(latest_date(tables.status_dates.iter(), vehicle_id))
    }
}

#[async_trait]
impl StatusHistoryRepository for MemoryStore {
    async fn find_by_vehicle(&self, vehicle_id: i64, window: HistoryWindow) -> AppResult<StatusHistoryPage> {
        let tables = self.inner.tables.read().await;

        let mut statuses: Vec<&StatusRecord> =
            tables.statuses.iter().filter(|s| s.vehicle_id == vehicle_id).collect();
        statuses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = statuses.len() as i64;
        let (limit, offset) = window.limit_offset();
        let limit = limit.map_or(usize::MAX, |l| l as usize);

        let rows = statuses
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .map(|status| {
                let Some(status_type) = tables.status_types.get(&status.status_type_id) else {
                    error!(
                        "❌ Situación {} referencia tipo inexistente {}",
                        status.id, status.status_type_id
                    );
                    return Err(AppError::Internal(format!(
                        "status {} references missing status type {}",
                        status.id, status.status_type_id
                    )));
                };
                let km = tables
                    .odometer_readings
                    .iter()
                    .find(|r| r.id == status.odometer_reading_id)
                    .map(|r| r.km);
                Ok(StatusHistoryRow {
                    id: status.id,
                    status_type_name: status_type.name.clone(),
                    status_type_specification: status_type.specification.clone(),
                    observation: status.observation.clone(),
                    created_at: status.created_at,
                    effective_date: status.effective_date,
                    km,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(StatusHistoryPage { total, rows })
    }
}

#[async_trait]
impl TransitionRepository for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn TransitionUnit>> {
        Ok(Box::new(MemoryTransitionUnit {
            store: self.clone(),
            guard: None,
            odometer_readings: Vec::new(),
            status_dates: Vec::new(),
            statuses: Vec::new(),
            pointer_updates: Vec::new(),
        }))
    }
}

pub struct MemoryTransitionUnit {
    store: MemoryStore,
    guard: Option<OwnedMutexGuard<()>>,
    odometer_readings: Vec<OdometerReading>,
    status_dates: Vec<StatusDate>,
    statuses: Vec<StatusRecord>,
    pointer_updates: Vec<(i64, i64)>,
}

#[async_trait]
impl TransitionUnit for MemoryTransitionUnit {
    async fn lock_vehicle(&mut self, id: i64) -> AppResult<Option<Vehicle>> {
        if self.guard.is_none() {
            let lock = self.store.vehicle_lock(id);
            self.guard = Some(lock.lock_owned().await);
            debug!("🔒 Vehículo {} bloqueado (memoria)", id);
        }
        self.store.find_by_id(id).await
    }

    async fn latest_odometer(&mut self, vehicle_id: i64) -> AppResult<Option<OdometerReading>> {
        let tables = self.store.inner.tables.read().await;
        Ok(latest_reading(
            tables.odometer_readings.iter().chain(self.odometer_readings.iter()),
            vehicle_id,
        ))
    }

    async fn latest_status_date(&mut self, vehicle_id: i64) -> AppResult<Option<StatusDate>> {
        let tables = self.store.inner.tables.read().await;
        Ok(latest_date(
            tables.status_dates.iter().chain(self.status_dates.iter()),
            vehicle_id,
        ))
    }

    async fn insert_odometer_reading(&mut self, reading: NewOdometerReading) -> AppResult<OdometerReading> {
        self.store.take_fault(WriteStep::OdometerReading)?;
        if reading.km < 0 {
            return Err(AppError::Internal("km violates CHECK (km >= 0)".to_string()));
        }

        let created = OdometerReading {
            id: next_id(&self.store.inner.sequences.odometer_readings),
            vehicle_id: reading.vehicle_id,
            km: reading.km,
            created_by: reading.created_by,
            created_at: Utc::now(),
        };
        self.odometer_readings.push(created.clone());
        Ok(created)
    }

    async fn insert_status_date(&mut self, date: NewStatusDate) -> AppResult<StatusDate> {
        self.store.take_fault(WriteStep::StatusDate)?;

        let created = StatusDate {
            id: next_id(&self.store.inner.sequences.status_dates),
            vehicle_id: date.vehicle_id,
            effective_date: date.effective_date,
            created_by: date.created_by,
            created_at: Utc::now(),
        };
        self.status_dates.push(created.clone());
        Ok(created)
    }

    async fn insert_status(&mut self, status: NewStatusRecord) -> AppResult<StatusRecord> {
        self.store.take_fault(WriteStep::Status)?;

        {
            let tables = self.store.inner.tables.read().await;
            if !tables.status_types.contains_key(&status.status_type_id) {
                return Err(AppError::Internal(format!(
                    "status type {} violates foreign key",
                    status.status_type_id
                )));
            }
        }
        if !self.odometer_readings.iter().any(|r| r.id == status.odometer_reading_id)
            || !self.status_dates.iter().any(|d| d.id == status.status_date_id)
        {
            return Err(AppError::Internal(
                "status references records outside this unit".to_string(),
            ));
        }

        let created = StatusRecord {
            id: next_id(&self.store.inner.sequences.statuses),
            vehicle_id: status.vehicle_id,
            status_type_id: status.status_type_id,
            odometer_reading_id: status.odometer_reading_id,
            status_date_id: status.status_date_id,
            effective_date: status.effective_date,
            observation: status.observation,
            created_by: status.created_by,
            created_at: Utc::now(),
        };
        self.statuses.push(created.clone());
        Ok(created)
    }

    async fn update_vehicle_status_type(&mut self, vehicle_id: i64, status_type_id: i64) -> AppResult<()> {
        self.store.take_fault(WriteStep::VehiclePointer)?;

        let tables = self.store.inner.tables.read().await;
        if !tables.vehicles.contains_key(&vehicle_id) {
            return Err(AppError::Internal(format!(
                "vehicle {} pointer update affected 0 rows",
                vehicle_id
            )));
        }
        drop(tables);

        self.pointer_updates.push((vehicle_id, status_type_id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.store.take_fault(WriteStep::Commit)?;

        let unit = *self;
        let mut tables = unit.store.inner.tables.write().await;
        tables.odometer_readings.extend(unit.odometer_readings);
        tables.status_dates.extend(unit.status_dates);
        tables.statuses.extend(unit.statuses);
        for (vehicle_id, status_type_id) in unit.pointer_updates {
            if let Some(vehicle) = tables.vehicles.get_mut(&vehicle_id) {
                vehicle.status_type_id = Some(status_type_id);
            }
        }
        drop(tables);
        drop(unit.guard);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn write_transition(store: &MemoryStore, vehicle_id: i64, status_type_id: i64, km: i64) -> AppResult<()> {
        let mut unit = store.begin().await?;
        unit.lock_vehicle(vehicle_id).await?;
        let reading = unit
            .insert_odometer_reading(NewOdometerReading { vehicle_id, km, created_by: 1 })
            .await?;
        let status_date = unit
            .insert_status_date(NewStatusDate {
                vehicle_id,
                effective_date: date(2024, 1, 10),
                created_by: 1,
            })
            .await?;
        unit.insert_status(NewStatusRecord {
            vehicle_id,
            status_type_id,
            odometer_reading_id: reading.id,
            status_date_id: status_date.id,
            effective_date: status_date.effective_date,
            observation: None,
            created_by: 1,
        })
        .await?;
        unit.update_vehicle_status_type(vehicle_id, status_type_id).await?;
        unit.commit().await
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let vehicle = store.add_vehicle("ABC1D23").await;

        let mut unit = store.begin().await.unwrap();
        unit.lock_vehicle(vehicle.id).await.unwrap();
        unit.insert_odometer_reading(NewOdometerReading {
            vehicle_id: vehicle.id,
            km: 10,
            created_by: 1,
        })
        .await
        .unwrap();

        assert!(store.odometer_readings_for(vehicle.id).await.is_empty());
        unit.rollback().await.unwrap();
        assert!(store.odometer_readings_for(vehicle.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_applies_all_writes() {
        let store = MemoryStore::new();
        let status_type = store.add_status_type("Ativo", None).await;
        let vehicle = store.add_vehicle("ABC1D23").await;

        write_transition(&store, vehicle.id, status_type.id, 500).await.unwrap();

        assert_eq!(store.odometer_readings_for(vehicle.id).await.len(), 1);
        assert_eq!(store.status_dates_for(vehicle.id).await.len(), 1);
        assert_eq!(store.statuses_for(vehicle.id).await.len(), 1);
        let vehicle = store.find_by_id(vehicle.id).await.unwrap().unwrap();
        assert_eq!(vehicle.status_type_id, Some(status_type.id));
    }

    #[tokio::test]
    async fn test_unknown_status_type_is_rejected_by_foreign_key() {
        let store = MemoryStore::new();
        let vehicle = store.add_vehicle("ABC1D23").await;

        let result = write_transition(&store, vehicle.id, 99, 500).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(store.statuses_for(vehicle.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_history_with_missing_status_type_is_internal_error() {
        let store = MemoryStore::new();
        let status_type = store.add_status_type("Ativo", None).await;
        let vehicle = store.add_vehicle("ABC1D23").await;
        write_transition(&store, vehicle.id, status_type.id, 500).await.unwrap();

        store.inner.tables.write().await.status_types.remove(&status_type.id);

        let result = store.find_by_vehicle(vehicle.id, HistoryWindow::All).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let store = MemoryStore::new();
        let status_type = store.add_status_type("Ativo", None).await;
        let vehicle = store.add_vehicle("ABC1D23").await;

        store.fail_on(WriteStep::Commit);
        assert!(write_transition(&store, vehicle.id, status_type.id, 500).await.is_err());
        assert!(store.odometer_readings_for(vehicle.id).await.is_empty());

        write_transition(&store, vehicle.id, status_type.id, 500).await.unwrap();
        assert_eq!(store.statuses_for(vehicle.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_latest_status_date_prefers_greatest_effective_date() {
        let store = MemoryStore::new();
        let vehicle = store.add_vehicle("ABC1D23").await;

        let mut unit = store.begin().await.unwrap();
        unit.lock_vehicle(vehicle.id).await.unwrap();
        for effective_date in [date(2024, 3, 1), date(2024, 1, 1)] {
            unit.insert_status_date(NewStatusDate {
                vehicle_id: vehicle.id,
                effective_date,
                created_by: 1,
            })
            .await
            .unwrap();
        }
        let latest = unit.latest_status_date(vehicle.id).await.unwrap().unwrap();
        assert_eq!(latest.effective_date, date(2024, 3, 1));
    }
}
