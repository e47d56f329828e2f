use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use fleet_status::config::EnvironmentConfig;
use fleet_status::repositories::MemoryStore;
use fleet_status::routes::create_router;
use fleet_status::state::{AppState, Repositories};
use fleet_status::utils::jwt::{generate_token, JwtConfig};

const SECRET: &str = "api-test-secret";

struct TestApp {
    router: Router,
    token: String,
    vehicle_id: i64,
}

async fn create_test_app() -> TestApp {
    let store = MemoryStore::new();
    store.add_status_type("Ativo", None).await;
    store.add_status_type("Manutenção", Some("Revisão preventiva")).await;
    store.add_status_type("Parado", None).await;
    let vehicle = store.add_vehicle("ABC1D23").await;

    let config = EnvironmentConfig::for_tests(SECRET);
    let token = generate_token(7, &JwtConfig::from(&config)).unwrap();
    let router = create_router(AppState::new(config, Repositories::memory(store)));

    TestApp {
        router,
        token,
        vehicle_id: vehicle.id,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>, auth: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn propose(&self, body: Value) -> (StatusCode, Value) {
        let uri = format!("/api/vehicles/{}/statuses", self.vehicle_id);
        self.send(Method::POST, &uri, Some(body), true).await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = app.send(Method::GET, "/health", None, false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_propose_status_scenario() {
    let app = create_test_app().await;

    let (status, body) = app
        .propose(json!({ "status_type_id": 2, "effective_date": "2024-01-10", "km": 1000 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["km"], 1000);
    assert_eq!(body["data"]["effective_date"], "2024-01-10");
    assert_eq!(body["data"]["status_type_id"], 2);
    assert_eq!(body["data"]["created_by"], 7);

    let (status, body) = app
        .propose(json!({ "status_type_id": 3, "effective_date": "2024-01-05", "km": 1500 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BACKFILL_EXCEEDS_CURRENT_KM");

    let (status, body) = app
        .propose(json!({ "status_type_id": 3, "effective_date": "2024-01-15", "km": 900 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "ODOMETER_DECREASE");
    assert!(body["message"].as_str().unwrap().contains("odometer cannot decrease"));

    let (status, body) = app
        .propose(json!({ "status_type_id": 2, "effective_date": "2024-02-01", "km": 2000 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_propose_requires_bearer_token() {
    let app = create_test_app().await;
    let uri = format!("/api/vehicles/{}/statuses", app.vehicle_id);
    let body = json!({ "status_type_id": 1, "effective_date": "2024-01-10", "km": 10 });

    let (status, body) = app.send(Method::POST, &uri, Some(body), false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_propose_rejects_bad_ids_and_negative_km() {
    let app = create_test_app().await;
    let body = json!({ "status_type_id": 1, "effective_date": "2024-01-10", "km": 10 });

    let (status, response) = app
        .send(Method::POST, "/api/vehicles/abc/statuses", Some(body.clone()), true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "INVALID_INPUT");

    let (status, response) = app
        .send(Method::POST, "/api/vehicles/999/statuses", Some(body), true)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["code"], "NOT_FOUND");

    let (status, response) = app
        .propose(json!({ "status_type_id": 1, "effective_date": "2024-01-10", "km": -10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_status_type_hides_storage_detail() {
    let app = create_test_app().await;

    let (status, body) = app
        .propose(json!({ "status_type_id": 99, "effective_date": "2024-01-10", "km": 10 }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "TRANSITION_FAILED");
    assert!(!body.to_string().contains("foreign key"));
}

#[tokio::test]
async fn test_status_history() {
    let app = create_test_app().await;
    for (status_type_id, effective_date, km) in [(1, "2024-01-01", 100), (2, "2024-02-01", 250)] {
        let (status, _) = app
            .propose(json!({
                "status_type_id": status_type_id,
                "effective_date": effective_date,
                "km": km,
                "observation": "troca de óleo"
            }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!("/api/vehicles/{}/statuses", app.vehicle_id);
    let (status, body) = app.send(Method::GET, &uri, None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["statuses"][0]["name"], "Manutenção");
    assert_eq!(body["statuses"][0]["reason"], "Revisão preventiva");
    assert_eq!(body["statuses"][0]["km"], 250);
    assert_eq!(body["statuses"][0]["observation"], "troca de óleo");
    assert!(body["statuses"][1].get("reason").is_none());

    let (status, body) = app
        .send(Method::GET, &format!("{}?page=2&per_page=1", uri), None, true)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["statuses"].as_array().unwrap().len(), 1);
    assert_eq!(body["statuses"][0]["km"], 100);
}

#[tokio::test]
async fn test_status_history_rejects_mixed_paging() {
    let app = create_test_app().await;
    let uri = format!("/api/vehicles/{}/statuses", app.vehicle_id);

    for query in ["?page=1", "?per_page=10", "?page=x&per_page=10"] {
        let (status, body) = app
            .send(Method::GET, &format!("{}{}", uri, query), None, true)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {}", query);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    let (status, _) = app
        .send(Method::GET, "/api/vehicles/abc/statuses", None, true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
