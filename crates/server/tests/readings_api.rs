use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use api_types::reading::{ReadingCancelled, ReadingCreated, ReadingResponse, ReadingStatus};
use api_types::slots::SlotsResponse;
use migration::MigratorTrait;

const SCHEDULE_JSON: &str = r#"{"monday":[{"start":"09:00","end":"12:00"}]}"#;

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    seed_user(&db, "cleo", "client", 100).await;
    seed_user(&db, "mallory", "client", 100).await;
    seed_user(&db, "vera", "reader", 0).await;
    seed_user(&db, "root", "admin", 0).await;
    seed_reader(&db, "vera").await;

    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    server::app(engine, db)
}

async fn seed_user(db: &DatabaseConnection, id: &str, role: &str, credits: i64) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (id, password, role, credits) VALUES (?, ?, ?, ?)",
        vec![id.into(), "password".into(), role.into(), credits.into()],
    ))
    .await
    .unwrap();
}

async fn seed_reader(db: &DatabaseConnection, id: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO readers (user_id, status, instant_booking, time_zone, schedule) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            id.into(),
            "available".into(),
            true.into(),
            "UTC".into(),
            SCHEDULE_JSON.into(),
        ],
    ))
    .await
    .unwrap();
}

fn basic_auth(user: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:password"));
    format!("Basic {encoded}")
}

fn request(method: &str, uri: &str, user: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(user));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_body() -> Value {
    json!({
        "reader_id": "vera",
        "topic": "career",
        "question": "should I switch jobs?",
        "reading_option": {
            "type": "phone_call",
            "base_price": 20,
            "time_span": { "duration_minutes": 60, "label": "standard", "multiplier": 1.0 }
        }
    })
}

async fn create_reading(app: &Router) -> ReadingCreated {
    let response = app
        .clone()
        .oneshot(request("POST", "/readings", "cleo", Some(create_body())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn requests_without_credentials_are_unauthorized() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/readings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_credentials_are_unauthorized() {
    let app = test_app().await;

    for value in ["Bearer abc", "Basic not-base64!", "Basic"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/readings")
                    .header(header::AUTHORIZATION, value)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
    }
}

#[tokio::test]
async fn create_escrows_and_returns_the_new_balance() {
    let app = test_app().await;

    let created = create_reading(&app).await;
    assert_eq!(created.reading.status, ReadingStatus::InstantQueue);
    assert_eq!(created.reading.reading_option.final_price, Some(40));
    assert_eq!(created.reading.credits, 40);
    assert_eq!(created.credit_balance, 60);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/readings/{}", created.reading.id),
            "cleo",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: ReadingResponse = json_body(response).await;
    assert_eq!(fetched.reading.id, created.reading.id);
}

#[tokio::test]
async fn client_supplied_final_price_is_ignored() {
    let app = test_app().await;

    let mut body = create_body();
    body["reading_option"]["final_price"] = json!(1);

    let response = app
        .oneshot(request("POST", "/readings", "cleo", Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: ReadingCreated = json_body(response).await;
    assert_eq!(created.reading.reading_option.final_price, Some(40));
    assert_eq!(created.credit_balance, 60);
}

#[tokio::test]
async fn strangers_cannot_read_someone_elses_booking() {
    let app = test_app().await;
    let created = create_reading(&app).await;

    let response = app
        .oneshot(request(
            "GET",
            &format!("/readings/{}", created.reading.id),
            "mallory",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cancel_refunds_the_escrow() {
    let app = test_app().await;
    let created = create_reading(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/readings/{}", created.reading.id),
            "cleo",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: ReadingCancelled = json_body(response).await;
    assert_eq!(cancelled.refunded_credits, 40);
    assert_eq!(cancelled.credit_balance, 100);

    // Refunded is terminal; a second cancel is a client error.
    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/readings/{}", created.reading.id),
            "cleo",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reader_transitions_through_patch() {
    let app = test_app().await;
    let created = create_reading(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/readings/{}", created.reading.id),
            "vera",
            Some(json!({ "status": "in_progress", "reading_link": "https://meet.example/abc" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: ReadingResponse = json_body(response).await;
    assert_eq!(updated.reading.status, ReadingStatus::InProgress);
    assert_eq!(
        updated.reading.reading_link.as_deref(),
        Some("https://meet.example/abc")
    );

    // Once started, client edits are rejected.
    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/readings/{}", created.reading.id),
            "cleo",
            Some(json!({ "question": "still there?" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_transition_cannot_carry_field_edits() {
    let app = test_app().await;
    let created = create_reading(&app).await;

    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/readings/{}", created.reading.id),
            "vera",
            Some(json!({ "status": "in_progress", "question": "hijacked" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn edit_settles_the_price_difference() {
    let app = test_app().await;
    let created = create_reading(&app).await;

    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/readings/{}", created.reading.id),
            "cleo",
            Some(json!({
                "reading_option": {
                    "type": "phone_call",
                    "base_price": 20,
                    "time_span": { "duration_minutes": 30, "label": "short", "multiplier": 1.0 }
                }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = json_body(response).await;
    assert_eq!(updated["credit_difference"], json!(-20));
    assert_eq!(updated["credit_balance"], json!(80));
    assert_eq!(updated["reading"]["credits"], json!(20));
}

#[tokio::test]
async fn dispute_resolution_is_admin_only() {
    let app = test_app().await;
    let created = create_reading(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/readings/{}", created.reading.id),
            "cleo",
            Some(json!({ "status": "disputed", "dispute_reason": "no show" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/readings/{}/dispute/resolution", created.reading.id);
    let body = json!({ "response": "refund issued manually" });

    let response = app
        .clone()
        .oneshot(request("POST", &uri, "cleo", Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request("POST", &uri, "root", Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resolved: ReadingResponse = json_body(response).await;
    assert_eq!(resolved.reading.status, ReadingStatus::Disputed);
    let dispute = resolved.reading.dispute.unwrap();
    assert_eq!(
        dispute.admin_response.as_deref(),
        Some("refund issued manually")
    );
}

#[tokio::test]
async fn slots_endpoint_resolves_the_weekly_schedule() {
    let app = test_app().await;

    // 2026-08-31 is a Monday, covered by the seeded schedule.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/readers/vera/slots?date=2026-08-31&duration=60",
            "cleo",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let slots: SlotsResponse = json_body(response).await;
    assert!(slots.available);
    assert_eq!(slots.slots.first().map(String::as_str), Some("09:00"));
    assert_eq!(slots.slots.last().map(String::as_str), Some("11:00"));

    let response = app
        .oneshot(request(
            "GET",
            "/readers/nobody/slots?date=2026-08-31&duration=60",
            "cleo",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
