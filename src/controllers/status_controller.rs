use validator::Validate;

use crate::dto::status_dto::{ApiResponse, ProposeStatusRequest, StatusHistoryQuery, StatusHistoryResponse};
use crate::models::CommittedStatus;
use crate::services::{HistoryRequest, StatusQueryService, TransitionService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct StatusController {
    transitions: TransitionService,
    queries: StatusQueryService,
}

impl StatusController {
    pub fn new(state: &AppState) -> Self {
        let repositories = &state.repositories;
        Self {
            transitions: TransitionService::new(
                repositories.vehicles.clone(),
                repositories.odometers.clone(),
                repositories.status_dates.clone(),
                repositories.transitions.clone(),
                state.config.transition_timeout,
            ),
            queries: StatusQueryService::new(repositories.history.clone()),
        }
    }

    pub async fn propose(
        &self,
        vehicle_id: &str,
        acting_user_id: i64,
        request: ProposeStatusRequest,
    ) -> Result<ApiResponse<CommittedStatus>, AppError> {
        request.validate()?;

        let committed = self
            .transitions
            .propose(vehicle_id, acting_user_id, request.into())
            .await?;

        Ok(ApiResponse::success_with_message(
            committed,
            "Vehicle status recorded".to_string(),
        ))
    }

    pub async fn history(
        &self,
        vehicle_id: &str,
        query: StatusHistoryQuery,
    ) -> Result<StatusHistoryResponse, AppError> {
        let request = HistoryRequest::from_params(query.page.as_deref(), query.per_page.as_deref())?;
        self.queries.list(vehicle_id, request).await
    }
}
