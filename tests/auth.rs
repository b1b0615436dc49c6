mod common;

use actix_http::Request;
use actix_web::body::{self, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{rt, test, web, App, HttpServer};
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::TcpListener;
use taskline::auth::AuthMiddleware;
use taskline::error::TOKEN_EXPIRED_CODE;
use taskline::repository::UserRepository;
use taskline::routes::{self, health};

use common::Harness;

async fn init_app(
    h: &Harness,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(h.sessions.clone())
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::auth_config),
            ),
    )
    .await
}

/// Sends a request and returns status plus JSON body. Rejections raised by the
/// middleware come back as errors and are rendered the way the server would.
async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, bytes) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            (status, body::to_bytes(resp.into_body()).await.unwrap())
        }
    };

    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn post(uri: &str, payload: Value) -> Request {
    test::TestRequest::post().uri(uri).set_json(&payload).to_request()
}

fn get_with_token(uri: &str, token: &str) -> Request {
    test::TestRequest::get()
        .uri(uri)
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request()
}

fn credentials(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

async fn register<S, B>(app: &S, username: &str, password: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        post(
            "/api/auth/register",
            json!({ "username": username, "password": password, "name": "Test User" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed. Body: {}", body);
    body
}

fn token(body: &Value, field: &str) -> String {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("{} missing from {}", field, body))
        .to_string()
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let h = common::harness();
    let app = init_app(&h).await;

    let registered = register(&app, "integration_user", "Password123!").await;
    assert_eq!(registered["username"], "integration_user");
    assert_eq!(registered["name"], "Test User");
    assert!(registered.get("password_hash").is_none());
    assert!(!token(&registered, "access_token").is_empty());
    assert!(!token(&registered, "refresh_token").is_empty());

    let (status, body) = send(
        &app,
        post(
            "/api/auth/register",
            json!({ "username": "integration_user", "password": "Password123!", "name": "Again" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Body: {}", body);
    assert_eq!(body["error"], "Username already exists");

    let (status, login) = send(
        &app,
        post("/api/auth/login", credentials("integration_user", "Password123!")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Login failed. Body: {}", login);
    assert_eq!(login["user_id"], registered["user_id"]);

    let (status, me) = send(&app, get_with_token("/api/user/me", &token(&login, "access_token"))).await;
    assert_eq!(status, StatusCode::OK, "Body: {}", me);
    assert_eq!(me["id"], registered["user_id"]);
    assert_eq!(me["username"], "integration_user");
    assert_eq!(me["organization_users"], 1);

    // Two logins, two stored refresh tokens.
    assert_eq!(h.tokens.len().await, 2);
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let h = common::harness();
    let app = init_app(&h).await;

    let test_cases = vec![
        (
            json!({ "password": "Password123!", "name": "Test" }),
            StatusCode::BAD_REQUEST,
            "missing username",
        ),
        (
            json!({ "username": "testuser", "name": "Test" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "username": "testuser", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing name",
        ),
        (
            json!({ "username": "ab", "password": "Password123!", "name": "Test" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username too short",
        ),
        (
            json!({ "username": "a".repeat(51), "password": "Password123!", "name": "Test" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username too long",
        ),
        (
            json!({ "username": "user name!", "password": "Password123!", "name": "Test" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username with invalid chars",
        ),
        (
            json!({ "username": "testuser", "password": "12345", "name": "Test" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
        (
            json!({ "username": "testuser", "password": "Password123!", "name": "" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty name",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let (status, body) = send(&app, post("/api/auth/register", payload)).await;
        assert_eq!(
            status, expected_status,
            "Test case failed: {}. Body: {}",
            description, body
        );
    }

    assert_eq!(h.users.count().await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let h = common::harness();
    let app = init_app(&h).await;
    register(&app, "login_test_user", "Password123!").await;

    let (wrong_status, wrong_body) = send(
        &app,
        post("/api/auth/login", credentials("login_test_user", "WrongPassword")),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        post("/api/auth/login", credentials("nobody_here", "Password123!")),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let (status, _) = send(&app, post("/api/auth/login", json!({ "username": "login_test_user" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "missing password");
}

#[actix_rt::test]
async fn test_protected_routes_require_bearer_token() {
    let h = common::harness();
    let app = init_app(&h).await;
    let registered = register(&app, "guarded", "Password123!").await;

    let req = test::TestRequest::get().uri("/api/user/me").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing token");

    let access = token(&registered, "access_token");
    for value in [format!("Token {}", access), "Bearer".to_string()] {
        let req = test::TestRequest::get()
            .uri("/api/user/me")
            .append_header((header::AUTHORIZATION, value.clone()))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", value);
        assert_eq!(body["error"], "Invalid authorization format");
    }

    // A refresh token is not an access token.
    let (status, body) = send(
        &app,
        get_with_token("/api/user/me", &token(&registered, "refresh_token")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
    assert!(body.get("code").is_none());

    // The health check sits outside the guarded scope.
    let req = test::TestRequest::get().uri("/health").to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_expired_access_token_is_flagged_and_refreshable() {
    let h = common::harness();
    let app = init_app(&h).await;
    let registered = register(&app, "sleepy", "Password123!").await;
    let access = token(&registered, "access_token");
    let refresh = token(&registered, "refresh_token");

    h.clock.advance(h.sessions.settings().access_ttl + Duration::seconds(1));

    let (status, body) = send(&app, get_with_token("/api/user/me", &access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], TOKEN_EXPIRED_CODE);

    let (status, refreshed) = send(&app, post("/api/auth/refresh", json!({ "refresh_token": refresh }))).await;
    assert_eq!(status, StatusCode::OK, "Body: {}", refreshed);
    assert!(refreshed.get("refresh_token").is_none());

    let (status, me) = send(&app, get_with_token("/api/user/me", &token(&refreshed, "access_token"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "sleepy");
}

#[actix_rt::test]
async fn test_expired_refresh_token_is_flagged() {
    let h = common::harness();
    let app = init_app(&h).await;
    let registered = register(&app, "dormant", "Password123!").await;

    h.clock.advance(h.sessions.settings().refresh_ttl + Duration::seconds(1));

    let (status, body) = send(
        &app,
        post("/api/auth/refresh", json!({ "refresh_token": token(&registered, "refresh_token") })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], TOKEN_EXPIRED_CODE);
}

#[actix_rt::test]
async fn test_logout_revokes_refresh_token() {
    let h = common::harness();
    let app = init_app(&h).await;
    let registered = register(&app, "leaving", "Password123!").await;
    let refresh = json!({ "refresh_token": token(&registered, "refresh_token") });

    let (status, body) = send(&app, post("/api/auth/logout", refresh.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    let (status, body) = send(&app, post("/api/auth/refresh", refresh.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    // Logging out again, or with garbage, still succeeds.
    let (status, _) = send(&app, post("/api/auth/logout", refresh)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, post("/api/auth/logout", json!({ "refresh_token": "garbage" }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_logout_all_ends_every_session() {
    let h = common::harness();
    let app = init_app(&h).await;
    let first = register(&app, "everywhere", "Password123!").await;
    let (_, second) = send(&app, post("/api/auth/login", credentials("everywhere", "Password123!"))).await;
    let bystander = register(&app, "bystander", "Password123!").await;

    let (status, _) = send(&app, post("/api/auth/logout-all", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/logout-all")
        .append_header((
            header::AUTHORIZATION,
            format!("Bearer {}", token(&second, "access_token")),
        ))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    for session in [&first, &second] {
        let (status, _) = send(
            &app,
            post("/api/auth/refresh", json!({ "refresh_token": token(session, "refresh_token") })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send(
        &app,
        post("/api/auth/refresh", json!({ "refresh_token": token(&bystander, "refresh_token") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_unauthorized_over_http() {
    let h = common::harness();

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let sessions = h.sessions.clone();
    let server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(sessions.clone())
                .wrap(Logger::default())
                .service(health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let resp = client
        .post(format!("{}/api/tasks", base))
        .json(&json!({ "name": "Unauthorized Task" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({ "username": "over_http", "password": "Password123!", "name": "Remote" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let body: Value = resp.json().await.expect("register response is JSON");

    let resp = client
        .get(format!("{}/api/user/me", base))
        .bearer_auth(token(&body, "access_token"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    server_handle.abort();
}
