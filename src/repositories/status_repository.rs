use async_trait::async_trait;
use sqlx::PgPool;

use super::{HistoryWindow, StatusHistoryRepository};
use crate::models::{StatusHistoryPage, StatusHistoryRow};
use crate::utils::errors::{AppError, AppResult};

pub struct PgStatusRepository {
    pool: PgPool,
}

impl PgStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusHistoryRepository for PgStatusRepository {
    async fn find_by_vehicle(&self, vehicle_id: i64, window: HistoryWindow) -> AppResult<StatusHistoryPage> {
        let (limit, offset) = window.limit_offset();

        // LIMIT NULL en PostgreSQL equivale a sin límite
        let rows = sqlx::query_as::<_, StatusHistoryRow>(
            r#"
            SELECT
                s.id,
                t.name AS status_type_name,
                t.specification AS status_type_specification,
                s.observation,
                s.created_at,
                s.effective_date,
                k.km
            FROM vehicle_statuses s
            JOIN status_types t ON t.id = s.status_type_id
            LEFT JOIN odometer_readings k ON k.id = s.odometer_reading_id
            WHERE s.vehicle_id = $1
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(vehicle_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vehicle_statuses WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(StatusHistoryPage { total, rows })
    }
}
