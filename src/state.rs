//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: configuración y repositorios inyectados.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{
    MemoryStore, OdometerRepository, PgOdometerRepository, PgStatusDateRepository, PgStatusRepository,
    PgTransitionRepository, PgVehicleRepository, StatusDateRepository, StatusHistoryRepository,
    TransitionRepository, VehicleRepository,
};

/// Conjunto de repositorios que consumen los servicios
#[derive(Clone)]
pub struct Repositories {
    pub vehicles: Arc<dyn VehicleRepository>,
    pub odometers: Arc<dyn OdometerRepository>,
    pub status_dates: Arc<dyn StatusDateRepository>,
    pub history: Arc<dyn StatusHistoryRepository>,
    pub transitions: Arc<dyn TransitionRepository>,
}

impl Repositories {
    /// Repositorios sobre PostgreSQL
    pub fn postgres(pool: PgPool, config: &EnvironmentConfig) -> Self {
        Self {
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            odometers: Arc::new(PgOdometerRepository::new(pool.clone())),
            status_dates: Arc::new(PgStatusDateRepository::new(pool.clone())),
            history: Arc::new(PgStatusRepository::new(pool.clone())),
            transitions: Arc::new(PgTransitionRepository::new(
                pool,
                config.lock_timeout,
                config.transition_timeout,
            )),
        }
    }

    /// Repositorios sobre el store en memoria
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            vehicles: store.clone(),
            odometers: store.clone(),
            status_dates: store.clone(),
            history: store.clone(),
            transitions: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repositories: Repositories,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, repositories: Repositories) -> Self {
        Self { config, repositories }
    }
}
