//! Repositorios
//!
//! Interfaces de almacenamiento que consume el motor de transiciones y sus
//! implementaciones: PostgreSQL (sqlx) y en memoria.

use async_trait::async_trait;

use crate::models::{
    NewOdometerReading, NewStatusDate, NewStatusRecord, OdometerReading, StatusDate,
    StatusHistoryPage, StatusRecord, Vehicle,
};
use crate::utils::errors::AppResult;

pub mod memory;
pub mod odometer_repository;
pub mod status_date_repository;
pub mod status_repository;
pub mod transition_repository;
pub mod vehicle_repository;

pub use memory::{MemoryStore, WriteStep};
pub use odometer_repository::PgOdometerRepository;
pub use status_date_repository::PgStatusDateRepository;
pub use status_repository::PgStatusRepository;
pub use transition_repository::PgTransitionRepository;
pub use vehicle_repository::PgVehicleRepository;

/// Página solicitada del historial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    All,
    Page { page: u32, per_page: u32 },
}

impl HistoryWindow {
    /// `(limit, offset)`; sin límite para `All`
    pub fn limit_offset(&self) -> (Option<i64>, i64) {
        match *self {
            HistoryWindow::All => (None, 0),
            HistoryWindow::Page { page, per_page } => {
                let per_page = i64::from(per_page);
                (Some(per_page), i64::from(page.saturating_sub(1)) * per_page)
            }
        }
    }
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Vehicle>>;
}

#[async_trait]
pub trait OdometerRepository: Send + Sync {
    /// Lectura con mayor orden de creación
    async fn find_latest_by_vehicle(&self, vehicle_id: i64) -> AppResult<Option<OdometerReading>>;
}

#[async_trait]
pub trait StatusDateRepository: Send + Sync {
    /// Fecha efectiva más reciente; empates por orden de creación
    async fn find_latest_by_vehicle(&self, vehicle_id: i64) -> AppResult<Option<StatusDate>>;
}

#[async_trait]
pub trait StatusHistoryRepository: Send + Sync {
    /// Historial del vehículo, más reciente primero
    async fn find_by_vehicle(&self, vehicle_id: i64, window: HistoryWindow) -> AppResult<StatusHistoryPage>;
}

/// Abre unidades atómicas de escritura
#[async_trait]
pub trait TransitionRepository: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn TransitionUnit>>;
}

/// Unidad atómica de una transición.
///
/// Todo lo escrito se confirma junto en `commit` o se descarta en `rollback`.
/// Soltar la unidad sin confirmar equivale a `rollback` y libera el lock.
#[async_trait]
pub trait TransitionUnit: Send {
    /// Bloquea la fila del vehículo hasta el fin de la unidad
    async fn lock_vehicle(&mut self, id: i64) -> AppResult<Option<Vehicle>>;
    async fn latest_odometer(&mut self, vehicle_id: i64) -> AppResult<Option<OdometerReading>>;
    async fn latest_status_date(&mut self, vehicle_id: i64) -> AppResult<Option<StatusDate>>;
    async fn insert_odometer_reading(&mut self, reading: NewOdometerReading) -> AppResult<OdometerReading>;
    async fn insert_status_date(&mut self, date: NewStatusDate) -> AppResult<StatusDate>;
    async fn insert_status(&mut self, status: NewStatusRecord) -> AppResult<StatusRecord>;
    async fn update_vehicle_status_type(&mut self, vehicle_id: i64, status_type_id: i64) -> AppResult<()>;
    async fn commit(self: Box<Self>) -> AppResult<()>;
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
