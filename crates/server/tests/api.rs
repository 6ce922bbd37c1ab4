use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::{Duration, Local};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{Credentials, CredentialsConfig, ServerState};

const TEST_COST: u32 = 4;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let credentials = Credentials::new(CredentialsConfig {
        secret: "test-secret".to_string(),
        token_ttl: Duration::hours(1),
        hash_cost: TEST_COST,
    })
    .unwrap();
    server::router(ServerState::new(engine, credentials))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

async fn register(app: &Router, username: &str) -> String {
    let reply = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["token"].as_str().unwrap().to_string()
}

async fn category_id(app: &Router, token: &str, kind: &str, name: &str) -> String {
    let reply = send(
        app,
        Method::GET,
        &format!("/categories?type={kind}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply
        .json()
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn today() -> String {
    Local::now().date_naive().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let reply = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn register_returns_token_and_profile() {
    let app = app().await;
    let reply = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "Alice@Example.com",
            "username": "alice",
            "password": "secret123",
        })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    let body = reply.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["currency"], "USD");
    assert_eq!(body["user"]["theme"], "light");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let profile = send(&app, Method::GET, "/user/profile", Some(token), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.json()["username"], "alice");
}

#[tokio::test]
async fn registration_validates_input() {
    let app = app().await;

    let short = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "a@example.com", "username": "a", "password": "12345" })),
    )
    .await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "a@example.com" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.json()["error"].is_string());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app().await;
    register(&app, "alice").await;

    let reply = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "ALICE@example.com",
            "username": "someone-else",
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json(), json!({ "error": "email already exists" }));
}

#[tokio::test]
async fn login_by_email_or_username() {
    let app = app().await;
    register(&app, "bob").await;

    for identifier in ["bob", "BOB@example.com"] {
        let reply = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email_or_username": identifier, "password": "secret123" })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json()["user"]["username"], "bob");
    }
}

#[tokio::test]
async fn bad_credentials_look_the_same() {
    let app = app().await;
    register(&app, "bob").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email_or_username": "bob", "password": "nope-nope" })),
    )
    .await;
    let unknown_user = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email_or_username": "nobody", "password": "secret123" })),
    )
    .await;

    for reply in [wrong_password, unknown_user] {
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.json(), json!({ "error": "invalid credentials" }));
    }
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app().await;

    let missing = send(&app, Method::GET, "/dashboard", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json(), json!({ "error": "unauthorized" }));

    let garbage = send(&app, Method::GET, "/income", Some("garbage"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.json(), json!({ "error": "unauthorized" }));
}

#[tokio::test]
async fn expense_today_updates_dashboard() {
    let app = app().await;
    let token = register(&app, "alice").await;
    let food = category_id(&app, &token, "expense", "Food").await;

    let created = send(
        &app,
        Method::POST,
        "/expense",
        Some(&token),
        Some(json!({
            "category_id": food,
            "amount": 50.0,
            "description": "groceries",
            "expense_date": today(),
        })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["category_name"], "Food");

    let reply = send(&app, Method::GET, "/dashboard", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["today_expense"], json!(50.0));
    assert_eq!(body["total_expense"], json!(50.0));
    assert_eq!(body["monthly_expense"], json!(50.0));
    assert_eq!(body["balance"], json!(-50.0));
    assert_eq!(body["daily_data"].as_array().unwrap().len(), 30);
    assert_eq!(
        body["category_breakdown"]["expense_by_category"],
        json!([{ "category_id": food, "category": "Food", "total": 50.0 }])
    );
    assert_eq!(body["category_breakdown"]["income_by_category"], json!([]));
}

#[tokio::test]
async fn record_validation_errors() {
    let app = app().await;
    let token = register(&app, "alice").await;
    let food = category_id(&app, &token, "expense", "Food").await;
    let salary = category_id(&app, &token, "income", "Salary").await;

    for amount in [0.0, -3.0, 0.001] {
        let reply = send(
            &app,
            Method::POST,
            "/expense",
            Some(&token),
            Some(json!({ "category_id": food, "amount": amount, "date": today() })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let mismatch = send(
        &app,
        Method::POST,
        "/expense",
        Some(&token),
        Some(json!({ "category_id": salary, "amount": 1.0, "date": today() })),
    )
    .await;
    assert_eq!(mismatch.status, StatusCode::UNPROCESSABLE_ENTITY);

    let bad_date = send(
        &app,
        Method::POST,
        "/income",
        Some(&token),
        Some(json!({ "category_id": salary, "amount": 1.0, "date": "yesterday" })),
    )
    .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);

    let bad_id = send(&app, Method::GET, "/income/not-a-uuid", Some(&token), None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn records_are_owner_scoped() {
    let app = app().await;
    let alice = register(&app, "alice").await;
    let mallory = register(&app, "mallory").await;
    let salary = category_id(&app, &alice, "income", "Salary").await;

    let created = send(
        &app,
        Method::POST,
        "/income",
        Some(&alice),
        Some(json!({ "category_id": salary, "amount": 1200.5, "income_date": "2025-03-01" })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.json()["id"].as_str().unwrap().to_string();
    let uri = format!("/income/{id}");

    let update = send(
        &app,
        Method::PUT,
        &uri,
        Some(&mallory),
        Some(json!({ "category_id": salary, "amount": 1.0, "date": "2025-03-02" })),
    )
    .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let delete = send(&app, Method::DELETE, &uri, Some(&mallory), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let read = send(&app, Method::GET, &uri, Some(&mallory), None).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);

    let listed = send(&app, Method::GET, "/income", Some(&mallory), None).await;
    assert_eq!(listed.json(), json!([]));

    let own = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json()["amount"], json!(1200.5));
    assert_eq!(own.json()["date"], "2025-03-01");
}

#[tokio::test]
async fn update_and_delete_own_record() {
    let app = app().await;
    let token = register(&app, "alice").await;
    let food = category_id(&app, &token, "expense", "Food").await;
    let rent = category_id(&app, &token, "expense", "Rent").await;

    let created = send(
        &app,
        Method::POST,
        "/expense",
        Some(&token),
        Some(json!({ "category_id": food, "amount": 12.3, "date": "2025-03-01" })),
    )
    .await;
    let id = created.json()["id"].as_str().unwrap().to_string();
    let uri = format!("/expense/{id}");

    let updated = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "category_id": rent, "amount": 900.0, "date": "2025-03-02" })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let body = updated.json();
    assert_eq!(body["category_name"], "Rent");
    assert_eq!(body["amount"], json!(900.0));
    assert_eq!(body["description"], Value::Null);

    let deleted = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.json(),
        json!({ "message": "expense deleted successfully" })
    );

    let gone = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_apply() {
    let app = app().await;
    let token = register(&app, "alice").await;
    let food = category_id(&app, &token, "expense", "Food").await;
    let rent = category_id(&app, &token, "expense", "Rent").await;

    for (category, date) in [(&food, "2025-02-27"), (&food, "2025-03-03"), (&rent, "2025-03-01")] {
        let reply = send(
            &app,
            Method::POST,
            "/expense",
            Some(&token),
            Some(json!({ "category_id": category, "amount": 10.0, "date": date })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let all = send(&app, Method::GET, "/expense", Some(&token), None).await;
    let dates: Vec<Value> = all
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["date"].clone())
        .collect();
    assert_eq!(dates, [json!("2025-03-03"), json!("2025-03-01"), json!("2025-02-27")]);

    let uri = format!("/expense?category_id={food}&start_date=2025-03-01&end_date=2025-03-31");
    let filtered = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(filtered.status, StatusCode::OK);
    assert_eq!(filtered.json().as_array().unwrap().len(), 1);

    let inverted = send(
        &app,
        Method::GET,
        "/expense?start_date=2025-03-31&end_date=2025-03-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(inverted.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn settings_update_returns_profile() {
    let app = app().await;
    let token = register(&app, "alice").await;

    let reply = send(
        &app,
        Method::PUT,
        "/user/settings",
        Some(&token),
        Some(json!({ "currency": "eur", "theme": "dark" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["currency"], "EUR");
    assert_eq!(reply.json()["theme"], "dark");

    let invalid = send(
        &app,
        Method::PUT,
        "/user/settings",
        Some(&token),
        Some(json!({ "theme": "sepia" })),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn categories_list_all_or_by_type() {
    let app = app().await;
    let token = register(&app, "alice").await;

    let all = send(&app, Method::GET, "/categories", Some(&token), None).await;
    assert_eq!(all.json().as_array().unwrap().len(), 12);

    let income = send(&app, Method::GET, "/categories?type=income", Some(&token), None).await;
    let names: Vec<Value> = income
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].clone())
        .collect();
    assert_eq!(
        names,
        [
            json!("Freelance"),
            json!("Investment"),
            json!("Other Income"),
            json!("Salary")
        ]
    );

    let bogus = send(&app, Method::GET, "/categories?type=savings", Some(&token), None).await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_returns_pdf_attachment() {
    let app = app().await;
    let token = register(&app, "alice").await;
    let salary = category_id(&app, &token, "income", "Salary").await;

    send(
        &app,
        Method::POST,
        "/income",
        Some(&token),
        Some(json!({ "category_id": salary, "amount": 3000.0, "date": "2025-06-01" })),
    )
    .await;

    let reply = send(
        &app,
        Method::GET,
        "/export/pdf?start_date=2025-06-01&end_date=2025-06-30",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        reply.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=report_2025-06-01_to_2025-06-30.pdf"
    );
    assert!(reply.body.starts_with(b"%PDF"));

    let inverted = send(
        &app,
        Method::GET,
        "/export/pdf?start_date=2025-06-30&end_date=2025-06-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(inverted.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn blank_query_values_mean_no_filter() {
    let app = app().await;
    let token = register(&app, "alice").await;
    let food = category_id(&app, &token, "expense", "Food").await;
    let salary = category_id(&app, &token, "income", "Salary").await;

    send(
        &app,
        Method::POST,
        "/expense",
        Some(&token),
        Some(json!({ "category_id": food, "amount": 12.5, "date": today() })),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/income",
        Some(&token),
        Some(json!({ "category_id": salary, "amount": 100.0, "date": today() })),
    )
    .await;

    let income = send(&app, Method::GET, "/income?date=", Some(&token), None).await;
    assert_eq!(income.status, StatusCode::OK);
    assert_eq!(income.json().as_array().unwrap().len(), 1);

    let expense = send(
        &app,
        Method::GET,
        "/expense?category_id=&date=&start_date=&end_date=",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(expense.status, StatusCode::OK);
    assert_eq!(expense.json().as_array().unwrap().len(), 1);

    let categories = send(&app, Method::GET, "/categories?type=", Some(&token), None).await;
    assert_eq!(categories.status, StatusCode::OK);
    assert_eq!(categories.json().as_array().unwrap().len(), 12);

    let export = send(
        &app,
        Method::GET,
        "/export/pdf?start_date=&end_date=",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(export.status, StatusCode::OK);
    let disposition = export.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.ends_with(&format!("_to_{}.pdf", today())));
    assert!(export.body.starts_with(b"%PDF"));
}
