use async_trait::async_trait;
use sqlx::PgPool;

use super::StatusDateRepository;
use crate::models::StatusDate;
use crate::utils::errors::{AppError, AppResult};

pub(crate) const LATEST_STATUS_DATE_SQL: &str = r#"
    SELECT id, vehicle_id, effective_date, created_by, created_at
    FROM status_dates
    WHERE vehicle_id = $1
    ORDER BY effective_date DESC, id DESC
    LIMIT 1
"#;

pub struct PgStatusDateRepository {
    pool: PgPool,
}

impl PgStatusDateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusDateRepository for PgStatusDateRepository {
    async fn find_latest_by_vehicle(&self, vehicle_id: i64) -> AppResult<Option<StatusDate>> {
        sqlx::query_as::<_, StatusDate>(LATEST_STATUS_DATE_SQL)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
