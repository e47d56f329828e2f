use async_trait::async_trait;
use sqlx::PgPool;

use super::OdometerRepository;
use crate::models::OdometerReading;
use crate::utils::errors::{AppError, AppResult};

pub(crate) const LATEST_ODOMETER_SQL: &str = r#"
    SELECT id, vehicle_id, km, created_by, created_at
    FROM odometer_readings
    WHERE vehicle_id = $1
    ORDER BY id DESC
    LIMIT 1
"#;

pub struct PgOdometerRepository {
    pool: PgPool,
}

impl PgOdometerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OdometerRepository for PgOdometerRepository {
    async fn find_latest_by_vehicle(&self, vehicle_id: i64) -> AppResult<Option<OdometerReading>> {
        sqlx::query_as::<_, OdometerReading>(LATEST_ODOMETER_SQL)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
