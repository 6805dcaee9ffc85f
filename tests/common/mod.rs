// tests/common/mod.rs

use estate_api::config::{Config, Environment};
use estate_api::routes;
use estate_api::state::AppState;
use estate_api::utils::hash::hash_password;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Spawns the app on a random port against the database from DATABASE_URL.
/// Returns `None` (skipping the test) when no database is configured.
pub async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        environment: Environment::Development,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some((address, pool))
}

pub fn unique_email(prefix: &str) -> String {
    format!(
        "{}_{}@example.com",
        prefix,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

/// Registers an account with the given role and returns (token, user id).
pub async fn register_user(
    client: &reqwest::Client,
    address: &str,
    role: &str,
) -> (String, i64) {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Test Account",
            "email": unique_email(role),
            "password": "password123",
            "role": role
        }))
        .send()
        .await
        .expect("Failed to execute register request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();
    (token, user_id)
}

/// Creates an admin account directly in the database (there is no public
/// registration path that grants admin in a deployed system) and logs in.
pub async fn admin_token(client: &reqwest::Client, address: &str, pool: &PgPool) -> String {
    let email = unique_email("admin");
    let hashed = hash_password("password123").unwrap();
    sqlx::query(
        "INSERT INTO users (name, email, password, role) VALUES ('Test Admin', $1, $2, 'admin')",
    )
    .bind(&email)
    .bind(&hashed)
    .execute(pool)
    .await
    .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Creates a draft listing in the given city and returns its id.
pub async fn create_draft(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    title: &str,
    city: &str,
    price: f64,
) -> i64 {
    let response = client
        .post(format!("{}/api/properties", address))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "description": "Spacious apartment close to the city center.",
            "location": { "address": "123 Bole Road", "city": city },
            "price": price,
            "category": "apartment",
            "bedrooms": 3
        }))
        .send()
        .await
        .expect("Failed to execute create request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

/// Attaches one image to a draft so it can be published.
pub async fn attach_image(client: &reqwest::Client, address: &str, token: &str, id: i64) {
    let response = client
        .put(format!("{}/api/properties/{}", address, id))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "images": [{ "url": "https://cdn.example.com/p/1.jpg", "caption": "Front" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

pub async fn publish(client: &reqwest::Client, address: &str, token: &str, id: i64) {
    let response = client
        .put(format!("{}/api/properties/{}/publish", address, id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

/// A unique city name scopes list assertions to the rows a test created,
/// so tests can share one database.
pub fn unique_city() -> String {
    format!("Testville-{}", &uuid::Uuid::new_v4().to_string()[..8])
}
