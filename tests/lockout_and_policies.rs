use std::net::TcpListener;
use std::sync::Arc;

use serde_json::{json, Value};

use taskhive::configuration::Settings;
use taskhive::sessions::InMemorySessionRegistry;
use taskhive::startup::run;
use taskhive::store::InMemoryUserStore;

pub struct TestApp {
    pub address: String,
    pub users: Arc<InMemoryUserStore>,
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.jwt.access_secret = "test-access-secret".to_string();
    settings.jwt.refresh_secret = "test-refresh-secret".to_string();
    settings.security.bcrypt_cost = 4;
    settings.security.rate_limit_max_requests = 10_000;
    settings
}

fn spawn_app() -> TestApp {
    spawn_app_with(test_settings())
}

fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let users = Arc::new(InMemoryUserStore::new());
    let sessions = Arc::new(InMemorySessionRegistry::new());
    let server =
        run(listener, users.clone(), sessions, settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address, users }
}

async fn register_with_role(app: &TestApp, email: &str, password: &str, role: &str) -> Value {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "email": email,
            "password": password,
            "first_name": "Test",
            "last_name": "User",
            "role": role,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

async fn login_attempt(app: &TestApp, email: &str, password: &str) -> (u16, Value) {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request");
    let status = response.status().as_u16();
    let body = response.json().await.expect("Failed to parse response");
    (status, body)
}

// --- Lockout ---

#[tokio::test]
async fn the_fifth_failed_attempt_locks_the_account() {
    let app = spawn_app();
    register_with_role(&app, "bob@example.com", "Sup3rSecret", "user").await;

    for attempt in 1..=4 {
        let (status, body) = login_attempt(&app, "bob@example.com", "WrongPassw0rd").await;
        assert_eq!(401, status, "attempt {}", attempt);
        assert_eq!(body["code"], "INVALID_CREDENTIALS", "attempt {}", attempt);
    }

    let (status, body) = login_attempt(&app, "bob@example.com", "WrongPassw0rd").await;
    assert_eq!(423, status);
    assert_eq!(body["code"], "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn a_locked_account_rejects_even_the_correct_password() {
    let app = spawn_app();
    register_with_role(&app, "bob@example.com", "Sup3rSecret", "user").await;

    for _ in 0..5 {
        login_attempt(&app, "bob@example.com", "WrongPassw0rd").await;
    }

    let (status, body) = login_attempt(&app, "bob@example.com", "Sup3rSecret").await;
    assert_eq!(423, status);
    assert_eq!(body["code"], "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn a_successful_login_resets_the_failure_counter() {
    let app = spawn_app();
    register_with_role(&app, "bob@example.com", "Sup3rSecret", "user").await;

    for _ in 0..4 {
        login_attempt(&app, "bob@example.com", "WrongPassw0rd").await;
    }
    let (status, _) = login_attempt(&app, "bob@example.com", "Sup3rSecret").await;
    assert_eq!(200, status);

    // The slate is clean: four more failures stay plain rejections.
    for attempt in 1..=4 {
        let (status, body) = login_attempt(&app, "bob@example.com", "WrongPassw0rd").await;
        assert_eq!(401, status, "attempt {}", attempt);
        assert_eq!(body["code"], "INVALID_CREDENTIALS", "attempt {}", attempt);
    }
}

// --- Role policies over HTTP ---

#[tokio::test]
async fn the_admin_overview_rejects_plain_users() {
    let app = spawn_app();
    let body = register_with_role(&app, "carol@example.com", "Sup3rSecret", "user").await;
    let access_token = body["access_token"].as_str().unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/api/admin/overview", app.address))
        .bearer_auth(access_token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn the_admin_overview_admits_admins_and_managers() {
    let app = spawn_app();
    let client = reqwest::Client::new();

    for (email, role) in [
        ("dave@example.com", "admin"),
        ("erin@example.com", "manager"),
    ] {
        let body = register_with_role(&app, email, "Sup3rSecret", role).await;
        let access_token = body["access_token"].as_str().unwrap().to_string();

        let response = client
            .get(format!("{}/api/admin/overview", app.address))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(200, response.status().as_u16(), "for role {}", role);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["role"], role);
    }
}

// --- Rate limiting ---

#[tokio::test]
async fn requests_over_the_ceiling_get_a_429_with_a_retry_hint() {
    let mut settings = test_settings();
    settings.security.rate_limit_max_requests = 3;
    settings.security.rate_limit_window_secs = 60;
    let app = spawn_app_with(settings);

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let response = client
            .get(format!("{}/health_check", app.address))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(200, response.status().as_u16());
    }

    let response = client
        .get(format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(429, response.status().as_u16());
    assert!(response.headers().get("Retry-After").is_some());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert!(body["retry_after"].as_u64().unwrap() >= 1);
}
