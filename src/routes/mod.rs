pub mod status_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::state::AppState;

/// Router completo de la API
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/vehicles", status_routes::create_status_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Endpoint de liveness
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "service": "fleet-status",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
