//! Unidad atómica de transición sobre PostgreSQL
//!
//! Cada unidad es una transacción READ COMMITTED que bloquea la fila del
//! vehículo con `SELECT ... FOR UPDATE`. Las lecturas posteriores al lock ven
//! lo confirmado por el titular anterior, así que las transiciones de un
//! mismo vehículo quedan serializadas y las de vehículos distintos no se
//! esperan entre sí.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::odometer_repository::LATEST_ODOMETER_SQL;
use super::status_date_repository::LATEST_STATUS_DATE_SQL;
use super::{TransitionRepository, TransitionUnit};
use crate::models::{
    NewOdometerReading, NewStatusDate, NewStatusRecord, OdometerReading, StatusDate, StatusRecord, Vehicle,
};
use crate::utils::errors::{AppError, AppResult};

pub struct PgTransitionRepository {
    pool: PgPool,
    lock_timeout: Duration,
    statement_timeout: Duration,
}

impl PgTransitionRepository {
    pub fn new(pool: PgPool, lock_timeout: Duration, statement_timeout: Duration) -> Self {
        Self {
            pool,
            lock_timeout,
            statement_timeout,
        }
    }
}

#[async_trait]
impl TransitionRepository for PgTransitionRepository {
    async fn begin(&self) -> AppResult<Box<dyn TransitionUnit>> {
        let mut tx = self.pool.begin().await?;

        // SET LOCAL no admite parámetros; los valores son enteros
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        Ok(Box::new(PgTransitionUnit { tx }))
    }
}

pub struct PgTransitionUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransitionUnit for PgTransitionUnit {
    async fn lock_vehicle(&mut self, id: i64) -> AppResult<Option<Vehicle>> {
        debug!("🔒 Bloqueando vehículo {}", id);
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT id, license_plate, status_type_id, created_at FROM vehicles WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(vehicle)
    }

    async fn latest_odometer(&mut self, vehicle_id: i64) -> AppResult<Option<OdometerReading>> {
        let reading = sqlx::query_as::<_, OdometerReading>(LATEST_ODOMETER_SQL)
            .bind(vehicle_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(reading)
    }

    async fn latest_status_date(&mut self, vehicle_id: i64) -> AppResult<Option<StatusDate>> {
        let date = sqlx::query_as::<_, StatusDate>(LATEST_STATUS_DATE_SQL)
            .bind(vehicle_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(date)
    }

    async fn insert_odometer_reading(&mut self, reading: NewOdometerReading) -> AppResult<OdometerReading> {
        let created = sqlx::query_as::<_, OdometerReading>(
            r#"
            INSERT INTO odometer_readings (vehicle_id, km, created_by, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, vehicle_id, km, created_by, created_at
            "#,
        )
        .bind(reading.vehicle_id)
        .bind(reading.km)
        .bind(reading.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(created)
    }

    async fn insert_status_date(&mut self, date: NewStatusDate) -> AppResult<StatusDate> {
        let created = sqlx::query_as::<_, StatusDate>(
            r#"
            INSERT INTO status_dates (vehicle_id, effective_date, created_by, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, vehicle_id, effective_date, created_by, created_at
            "#,
        )
        .bind(date.vehicle_id)
        .bind(date.effective_date)
        .bind(date.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(created)
    }

    async fn insert_status(&mut self, status: NewStatusRecord) -> AppResult<StatusRecord> {
        let created = sqlx::query_as::<_, StatusRecord>(
            r#"
            INSERT INTO vehicle_statuses (
                vehicle_id, status_type_id, odometer_reading_id, status_date_id,
                effective_date, observation, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id, vehicle_id, status_type_id, odometer_reading_id, status_date_id,
                      effective_date, observation, created_by, created_at
            "#,
        )
        .bind(status.vehicle_id)
        .bind(status.status_type_id)
        .bind(status.odometer_reading_id)
        .bind(status.status_date_id)
        .bind(status.effective_date)
        .bind(status.observation)
        .bind(status.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(created)
    }

    async fn update_vehicle_status_type(&mut self, vehicle_id: i64, status_type_id: i64) -> AppResult<()> {
        let result = sqlx::query("UPDATE vehicles SET status_type_id = $2 WHERE id = $1")
            .bind(vehicle_id)
            .bind(status_type_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() != 1 {
            return Err(AppError::Internal(format!(
                "vehicle {} pointer update affected {} rows",
                vehicle_id,
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
