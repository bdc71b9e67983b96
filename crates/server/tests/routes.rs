use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use chrono::{Days, Utc};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();

    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn basic_auth(credentials: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth("alice:password"))
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_auth_is_unauthorized() {
    let app = app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/recurrences")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/recurrences")
                .header(header::AUTHORIZATION, basic_auth("alice:nope"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_recurrences_generates_due_entries() {
    let app = app().await;
    let start = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(3))
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/recurrences",
            Some(json!({
                "amount_minor": 1200,
                "kind": "expense",
                "description": "gym",
                "frequency": "daily",
                "start_date": start.to_string(),
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request("GET", "/recurrences", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Three days ago through today inclusive.
    assert_eq!(body["sweep"][0]["generated"], 4);
    assert_eq!(body["recurrences"][0]["is_active"], true);

    let response = app
        .clone()
        .oneshot(request("GET", "/transactions", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["description"], "[Recurring] gym");
}

#[tokio::test]
async fn create_recurrence_with_invalid_amount_is_422() {
    let app = app().await;
    let response = app
        .oneshot(request(
            "POST",
            "/recurrences",
            Some(json!({
                "amount_minor": -5,
                "kind": "expense",
                "frequency": "monthly",
                "start_date": "2024-01-01",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("amount must be positive")
    );
}

#[tokio::test]
async fn unknown_frequency_is_rejected_at_the_boundary() {
    let app = app().await;
    let response = app
        .oneshot(request(
            "POST",
            "/recurrences",
            Some(json!({
                "amount_minor": 100,
                "kind": "expense",
                "frequency": "fortnightly",
                "start_date": "2024-01-01",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn generate_now_on_inactive_recurrence_is_400() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/recurrences",
            Some(json!({
                "amount_minor": 700,
                "kind": "expense",
                "frequency": "weekly",
                "start_date": "2024-01-01",
                "is_active": false,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(request(
            "POST",
            &format!("/recurrences/{id}/generate"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_recurrence_is_404() {
    let app = app().await;
    let response = app
        .oneshot(request(
            "PATCH",
            "/recurrences/00000000-0000-0000-0000-000000000000",
            Some(json!({ "amount_minor": 100 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_category_is_409() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/categories",
            Some(json!({ "name": "Rent" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request(
            "POST",
            "/categories",
            Some(json!({ "name": "Rent" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_recurrence_returns_no_content() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/recurrences",
            Some(json!({
                "amount_minor": 100,
                "kind": "income",
                "frequency": "yearly",
                "start_date": "2030-01-01",
            })),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/recurrences/{id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", "/recurrences", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["recurrences"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn one_off_transaction_append_and_recent_listing() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/transactions",
            Some(json!({
                "amount_minor": 2500,
                "kind": "income",
                "description": "refund",
                "occurred_on": "2024-03-05",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request("GET", "/transactions?limit=10", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["amount_minor"], 2500);
    assert_eq!(entries[0]["kind"], "income");
}
