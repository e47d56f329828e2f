//! Consulta del historial de situaciones
//!
//! Capa de lectura y formato: no valida invariantes de negocio.

use std::sync::Arc;

use crate::dto::status_dto::{StatusHistoryEntry, StatusHistoryResponse};
use crate::repositories::{HistoryWindow, StatusHistoryRepository};
use crate::utils::errors::{invalid_input_error, AppResult};
use crate::utils::validation::{parse_page_param, parse_vehicle_id};

/// Paginación explícita del historial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRequest {
    Unpaged,
    Paged { page: u32, per_page: u32 },
}

impl HistoryRequest {
    /// Ambos parámetros o ninguno; mezclarlos es `InvalidInput`
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> AppResult<Self> {
        let page = parse_page_param("page", page)?;
        let per_page = parse_page_param("per_page", per_page)?;

        match (page, per_page) {
            (None, None) => Ok(HistoryRequest::Unpaged),
            (Some(page), Some(per_page)) => Ok(HistoryRequest::Paged { page, per_page }),
            _ => Err(invalid_input_error("page and per_page must be supplied together")),
        }
    }
}

impl From<HistoryRequest> for HistoryWindow {
    fn from(request: HistoryRequest) -> Self {
        match request {
            HistoryRequest::Unpaged => HistoryWindow::All,
            HistoryRequest::Paged { page, per_page } => HistoryWindow::Page { page, per_page },
        }
    }
}

pub struct StatusQueryService {
    history: Arc<dyn StatusHistoryRepository>,
}

impl StatusQueryService {
    pub fn new(history: Arc<dyn StatusHistoryRepository>) -> Self {
        Self { history }
    }

    /// Historial del vehículo, más reciente primero
    pub async fn list(&self, vehicle_id: &str, request: HistoryRequest) -> AppResult<StatusHistoryResponse> {
        let vehicle_id = parse_vehicle_id(vehicle_id)?;
        let page = self.history.find_by_vehicle(vehicle_id, request.into()).await?;

        let (page_number, per_page) = match request {
            HistoryRequest::Unpaged => (None, None),
            HistoryRequest::Paged { page, per_page } => (Some(page), Some(per_page)),
        };

        Ok(StatusHistoryResponse {
            total: page.total,
            page: page_number,
            per_page,
            statuses: page.rows.into_iter().map(StatusHistoryEntry::from).collect(),
        })
    }
}
