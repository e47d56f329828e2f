use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::controllers::status_controller::StatusController;
use crate::dto::status_dto::{ApiResponse, ProposeStatusRequest, StatusHistoryQuery, StatusHistoryResponse};
use crate::middleware::ActingUser;
use crate::models::CommittedStatus;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_status_router() -> Router<AppState> {
    Router::new().route("/:id/statuses", get(list_statuses).post(propose_status))
}

// El id llega como texto: un id no numérico es InvalidInput, no un 404 de ruta
async fn propose_status(
    State(state): State<AppState>,
    user: ActingUser,
    Path(id): Path<String>,
    Json(request): Json<ProposeStatusRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommittedStatus>>), AppError> {
    let controller = StatusController::new(&state);
    let response = controller.propose(&id, user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_statuses(
    State(state): State<AppState>,
    _user: ActingUser,
    Path(id): Path<String>,
    Query(query): Query<StatusHistoryQuery>,
) -> Result<Json<StatusHistoryResponse>, AppError> {
    let controller = StatusController::new(&state);
    let response = controller.history(&id, query).await?;
    Ok(Json(response))
}
