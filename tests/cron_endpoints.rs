#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use chrono::NaiveDate;
use recurring_income::{
    config::{Settings, database},
    entities::{BudgetType, Income, client},
    notify::LogNotifier,
    server::{AppState, router},
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

async fn setup() -> (Router, DatabaseConnection) {
    let db = database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let state = AppState {
        db: db.clone(),
        settings: Arc::new(Settings::default()),
        notifier: Arc::new(LogNotifier),
        cron_secret: Arc::from(SECRET),
    };
    (router(state), db)
}

async fn insert_past_subscription(db: &DatabaseConnection) {
    client::ActiveModel {
        user_id: Set("user_1".to_string()),
        name: Set("Acme".to_string()),
        budget_type: Set(BudgetType::Business.as_str().to_string()),
        subscription_status: Set(client::SUBSCRIPTION_ACTIVE.to_string()),
        subscription_price: Set(250.0),
        subscription_start: Set(NaiveDate::from_ymd_opt(2024, 1, 10)),
        subscription_end: Set(NaiveDate::from_ymd_opt(2024, 3, 10)),
        subscription_cadence: Set(Some("MONTHLY".to_string())),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

fn cron_request(path: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(auth) = auth {
        builder = builder.header(AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_secret_is_rejected() {
    let (app, _db) = setup().await;

    let response = app
        .oneshot(cron_request("/api/cron/materialize", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["reason"].is_string());
}

#[tokio::test]
async fn test_wrong_secret_is_rejected_without_running_the_job() {
    let (app, db) = setup().await;
    insert_past_subscription(&db).await;

    let response = app
        .oneshot(cron_request("/api/cron/materialize", Some("Bearer nope")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(Income::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_materialize_endpoint_is_idempotent() {
    let (app, db) = setup().await;
    insert_past_subscription(&db).await;
    let auth = format!("Bearer {SECRET}");

    let response = app
        .clone()
        .oneshot(cron_request("/api/cron/materialize", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["createdCount"], 3);
    assert_eq!(body["clientsProcessed"], 1);

    let response = app
        .oneshot(cron_request("/api/cron/materialize", Some(&auth)))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["createdCount"], 0);
    assert_eq!(body["alreadyPresentCount"], 3);

    assert_eq!(Income::find().count(&db).await.unwrap(), 3);
}

#[tokio::test]
async fn test_get_is_accepted_for_cron_routes() {
    let (app, _db) = setup().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/cron/reconcile")
        .header(AUTHORIZATION, format!("Bearer {SECRET}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["corrected"], 0);
}

#[tokio::test]
async fn test_cleanup_and_budget_guard_report_shapes() {
    let (app, _db) = setup().await;
    let auth = format!("Bearer {SECRET}");

    let response = app
        .clone()
        .oneshot(cron_request("/api/cron/cleanup", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    for key in ["warnings30", "warnings7", "blocked", "deleted"] {
        assert_eq!(body[key], 0, "{key}");
    }

    let response = app
        .oneshot(cron_request("/api/cron/budget-guard", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["fixed"], 0);
}

#[tokio::test]
async fn test_fatal_job_error_maps_to_500() {
    let (app, db) = setup().await;
    // The client list can no longer be read, so the whole batch aborts
    db.execute_unprepared("DROP TABLE clients").await.unwrap();

    let response = app
        .oneshot(cron_request(
            "/api/cron/materialize",
            Some(&format!("Bearer {SECRET}")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["reason"].as_str().unwrap().contains("clients"));
}

#[tokio::test]
async fn test_health_needs_no_secret() {
    let (app, _db) = setup().await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));
}
