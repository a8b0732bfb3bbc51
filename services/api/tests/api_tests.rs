use api_lib::config::Config;
use api_lib::web::{self, state::AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lehrjournal_core::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@lehrjournal.ch";
const ADMIN_PASSWORD: &str = "admin-passwort";

async fn spawn_app() -> Router {
    let config = Arc::new(Config::default());
    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    state
        .provisioner()
        .bootstrap_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("Failed to seed admin");
    web::router(Arc::new(state))
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    bytes: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).expect("response is not JSON")
    }

    /// The `session=<id>` pair from `Set-Cookie`.
    fn session_cookie(&self) -> String {
        let set_cookie = self
            .headers
            .get(header::SET_COOKIE)
            .expect("no Set-Cookie header")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
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
    let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    Reply {
        status,
        headers,
        bytes,
    }
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let reply = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "login failed for {}", email);
    reply.session_cookie()
}

/// Admin session plus a company, a trainer and an apprentice with their sessions.
struct World {
    admin: String,
    company_id: String,
    trainer_id: String,
    trainer: String,
    apprentice_id: String,
    apprentice: String,
}

async fn seed_world(app: &Router) -> World {
    let admin = login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let company = send(
        app,
        Method::POST,
        "/companies",
        Some(&admin),
        Some(json!({ "name": "Holzbau Meier AG", "address": "Bahnhofstrasse 1, Bern" })),
    )
    .await;
    assert_eq!(company.status, StatusCode::CREATED);
    let company_id = company.json()["id"].as_str().unwrap().to_string();

    let trainer = send(
        app,
        Method::POST,
        "/functions/createTrainer",
        Some(&admin),
        Some(json!({ "email": "peter@holzbau.ch", "name": "Peter Meier", "company": company_id })),
    )
    .await;
    assert_eq!(trainer.status, StatusCode::OK);
    let trainer_body = trainer.json();
    let trainer_id = trainer_body["uid"].as_str().unwrap().to_string();

    let apprentice = send(
        app,
        Method::POST,
        "/functions/createApprentice",
        Some(&admin),
        Some(json!({
            "name": "Lena Graf",
            "company": company_id,
            "companyName": "Holzbau Meier AG",
            "trainerId": trainer_id,
        })),
    )
    .await;
    assert_eq!(apprentice.status, StatusCode::OK);
    let apprentice_body = apprentice.json();
    assert_eq!(
        apprentice_body["email"].as_str().unwrap(),
        "lenagrafholzbaumeierag@lernende.ch"
    );

    let trainer = login(
        app,
        "peter@holzbau.ch",
        trainer_body["password"].as_str().unwrap(),
    )
    .await;
    let apprentice = login(
        app,
        apprentice_body["email"].as_str().unwrap(),
        apprentice_body["password"].as_str().unwrap(),
    )
    .await;

    World {
        admin,
        company_id,
        trainer_id,
        trainer,
        apprentice_id: apprentice_body["uid"].as_str().unwrap().to_string(),
        apprentice,
    }
}

fn entry_draft(date: &str) -> Value {
    json!({
        "date": date,
        "category": "Montage",
        "tasks": ["Möbel montieren", "Türen einbauen"],
        "taskHours": { "Möbel montieren": 5.0, "Türen einbauen": 3.0 },
        "competencies": [
            { "name": "Sorgfalt", "status": "verbessert", "hours": 1.0, "rating": 5 }
        ]
    })
}

#[tokio::test]
async fn test_requests_without_session_are_unauthenticated() {
    let app = spawn_app().await;

    let reply = send(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["code"], "unauthenticated");

    let reply = send(
        &app,
        Method::POST,
        "/functions/createTrainer",
        None,
        Some(json!({ "email": "x@y.ch", "name": "X" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["code"], "unauthenticated");

    let reply = send(
        &app,
        Method::GET,
        "/auth/me",
        Some("session=not-a-real-session"),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = spawn_app().await;
    let reply = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": "falsch" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["code"], "unauthenticated");
}

#[tokio::test]
async fn test_me_and_logout() {
    let app = spawn_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let me = send(&app, Method::GET, "/auth/me", Some(&admin), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["role"], "admin");
    assert_eq!(me.json()["email"], ADMIN_EMAIL);

    let logout = send(&app, Method::POST, "/auth/logout", Some(&admin), None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    let me = send(&app, Method::GET, "/auth/me", Some(&admin), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_callables_require_an_admin() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/functions/createTrainer",
        Some(&world.trainer),
        Some(json!({ "email": "neu@holzbau.ch", "name": "Neu", "company": world.company_id })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.json()["code"], "permission-denied");

    let reply = send(
        &app,
        Method::POST,
        "/companies",
        Some(&world.apprentice),
        Some(json!({ "name": "Fremdfirma" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(
        &app,
        Method::POST,
        "/functions/createApprentice",
        Some(&world.admin),
        Some(json!({ "name": "Tim", "companyName": "Holzbau Meier AG" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "invalid-argument");
}

#[tokio::test]
async fn test_delete_user() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/functions/deleteUser",
        Some(&world.admin),
        Some(json!({ "uid": world.apprentice_id })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["success"], true);

    let users = send(&app, Method::GET, "/users?role=apprentice", Some(&world.admin), None).await;
    assert_eq!(users.status, StatusCode::OK);
    assert!(users.json().as_array().unwrap().is_empty());

    let reply = send(
        &app,
        Method::POST,
        "/functions/deleteUser",
        Some(&world.admin),
        Some(json!({ "uid": world.apprentice_id })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["code"], "not-found");
}

#[tokio::test]
async fn test_directory_listings() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let companies = send(&app, Method::GET, "/companies", Some(&world.apprentice), None).await;
    assert_eq!(companies.status, StatusCode::OK);
    assert_eq!(companies.json()[0]["name"], "Holzbau Meier AG");

    let trainers = send(&app, Method::GET, "/users?role=trainer", Some(&world.admin), None).await;
    assert_eq!(trainers.json().as_array().unwrap().len(), 1);
    let bad = send(&app, Method::GET, "/users?role=chef", Some(&world.admin), None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let uri = format!("/trainers/{}/apprentices", world.trainer_id);
    let own = send(&app, Method::GET, &uri, Some(&world.trainer), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json()[0]["name"], "Lena Graf");
    let foreign = send(&app, Method::GET, &uri, Some(&world.apprentice), None).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_entry_review_flow() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let submitted = send(
        &app,
        Method::PUT,
        "/entries",
        Some(&world.apprentice),
        Some(entry_draft("2024-06-03")),
    )
    .await;
    assert_eq!(submitted.status, StatusCode::OK);
    let entry = submitted.json();
    assert_eq!(entry["status"], "pending");
    assert_eq!(entry["trainerId"], world.trainer_id.as_str());
    let entry_id = entry["id"].as_str().unwrap().to_string();

    let by_trainer = send(&app, Method::PUT, "/entries", Some(&world.trainer), Some(entry_draft("2024-06-03"))).await;
    assert_eq!(by_trainer.status, StatusCode::FORBIDDEN);

    let listed = send(&app, Method::GET, "/entries", Some(&world.trainer), None).await;
    assert_eq!(listed.json().as_array().unwrap().len(), 1);

    let note_uri = format!("/entries/{}/note", entry_id);
    let reviewed = send(
        &app,
        Method::PUT,
        &note_uri,
        Some(&world.trainer),
        Some(json!({ "note": "Saubere Arbeit" })),
    )
    .await;
    assert_eq!(reviewed.status, StatusCode::OK);
    assert_eq!(reviewed.json()["status"], "reviewed");
    assert_eq!(reviewed.json()["trainerNote"], "Saubere Arbeit");

    let by_apprentice = send(
        &app,
        Method::PUT,
        &note_uri,
        Some(&world.apprentice),
        Some(json!({ "note": "selbst gelobt" })),
    )
    .await;
    assert_eq!(by_apprentice.status, StatusCode::FORBIDDEN);

    let ranged = send(
        &app,
        Method::GET,
        &format!("/entries?apprenticeId={}&from=2024-06-04", world.apprentice_id),
        Some(&world.admin),
        None,
    )
    .await;
    assert_eq!(ranged.status, StatusCode::OK);
    assert!(ranged.json().as_array().unwrap().is_empty());

    let deleted = send(
        &app,
        Method::DELETE,
        &format!("/entries/{}", entry_id),
        Some(&world.apprentice),
        None,
    )
    .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_invalid_entry_is_rejected() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let mut draft = entry_draft("2024-06-03");
    draft["competencies"][0]["rating"] = json!(9);
    let reply = send(&app, Method::PUT, "/entries", Some(&world.apprentice), Some(draft)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "invalid-argument");
}

#[tokio::test]
async fn test_statistics_and_report() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;
    send(&app, Method::PUT, "/entries", Some(&world.apprentice), Some(entry_draft("2024-06-03"))).await;
    send(&app, Method::PUT, "/entries", Some(&world.apprentice), Some(entry_draft("2024-06-04"))).await;

    let uri = format!("/apprentices/{}/statistics", world.apprentice_id);
    let stats = send(&app, Method::GET, &uri, Some(&world.trainer), None).await;
    assert_eq!(stats.status, StatusCode::OK);
    let stats = stats.json();
    assert_eq!(stats["entryCount"], 2);
    assert_eq!(stats["totalHours"], 16.0);

    let custom = send(
        &app,
        Method::GET,
        &format!("{}?filter=custom&from=2024-06-04&to=2024-06-04", uri),
        Some(&world.apprentice),
        None,
    )
    .await;
    assert_eq!(custom.json()["entryCount"], 1);

    let bad = send(&app, Method::GET, &format!("{}?filter=custom", uri), Some(&world.admin), None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let report = send(
        &app,
        Method::GET,
        &format!("/apprentices/{}/report", world.apprentice_id),
        Some(&world.apprentice),
        None,
    )
    .await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.headers[header::CONTENT_TYPE], "application/pdf");
    let disposition = report.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"Lena_Graf_Fortschritt_"));
    assert!(disposition.contains("filename*=UTF-8''Lena_Graf_Fortschritt_"));
    assert!(report.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_other_trainers_cannot_see_progress() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let other = send(
        &app,
        Method::POST,
        "/functions/createTrainer",
        Some(&world.admin),
        Some(json!({ "email": "anna@holzbau.ch", "name": "Anna Roth", "company": world.company_id })),
    )
    .await;
    let password = other.json()["password"].as_str().unwrap().to_string();
    let other = login(&app, "anna@holzbau.ch", &password).await;

    let uri = format!("/apprentices/{}/statistics", world.apprentice_id);
    let reply = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.json()["code"], "permission-denied");
}

#[tokio::test]
async fn test_join_code_login() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let issued = send(
        &app,
        Method::POST,
        "/codes",
        Some(&world.admin),
        Some(json!({ "name": "Jonas Weber", "trainerId": world.trainer_id, "companyId": world.company_id })),
    )
    .await;
    assert_eq!(issued.status, StatusCode::CREATED);
    let code = issued.json()["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 8);

    let first = send(
        &app,
        Method::POST,
        "/auth/code-login",
        None,
        Some(json!({ "code": code.to_lowercase() })),
    )
    .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.json()["created"], true);
    assert_eq!(first.json()["profile"]["companyName"], "Holzbau Meier AG");
    let session = first.session_cookie();
    let me = send(&app, Method::GET, "/auth/me", Some(&session), None).await;
    assert_eq!(me.json()["name"], "Jonas Weber");

    let second = send(&app, Method::POST, "/auth/code-login", None, Some(json!({ "code": code }))).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.json()["created"], false);

    let codes = send(&app, Method::GET, "/codes", Some(&world.trainer), None).await;
    assert_eq!(codes.status, StatusCode::FORBIDDEN);

    let revoked = send(&app, Method::DELETE, &format!("/codes/{}", code), Some(&world.admin), None).await;
    assert_eq!(revoked.status, StatusCode::NO_CONTENT);
    let unknown = send(&app, Method::POST, "/auth/code-login", None, Some(json!({ "code": code }))).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.json()["code"], "not-found");
}

#[tokio::test]
async fn test_company_maintenance() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;
    let uri = format!("/companies/{}", world.company_id);

    let updated = send(
        &app,
        Method::PUT,
        &uri,
        Some(&world.admin),
        Some(json!({ "name": "Holzbau Meier GmbH", "contact": "031 123 45 67" })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["name"], "Holzbau Meier GmbH");

    let blank = send(&app, Method::PUT, &uri, Some(&world.admin), Some(json!({ "name": "  " }))).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let by_trainer = send(&app, Method::DELETE, &uri, Some(&world.trainer), None).await;
    assert_eq!(by_trainer.status, StatusCode::FORBIDDEN);

    let deleted = send(&app, Method::DELETE, &uri, Some(&world.admin), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let again = send(&app, Method::DELETE, &uri, Some(&world.admin), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_are_invalid_arguments() {
    let app = spawn_app().await;
    let world = seed_world(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/functions/deleteUser",
        Some(&world.admin),
        Some(json!({ "uid": "not-a-uuid" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "invalid-argument");

    let reply = send(
        &app,
        Method::PUT,
        "/entries",
        Some(&world.apprentice),
        Some(json!({ "date": "31.12.2024" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "invalid-argument");

    let reply = send(&app, Method::GET, "/apprentices/xyz/statistics", Some(&world.trainer), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "invalid-argument");

    let uri = format!("/apprentices/{}/statistics?from=gestern", world.apprentice_id);
    let reply = send(&app, Method::GET, &uri, Some(&world.trainer), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "invalid-argument");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "invalid-argument");
}
