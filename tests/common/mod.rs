//! Shared setup for the HTTP tests.
//!
//! Tests touching the database are `#[ignore]`d by default. Run them with
//! `cargo test -- --ignored` and `DATABASE_URL` pointing at a scratch
//! postgres database.

use std::env::temp_dir;

use foodgram::{config::Config, state::State};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use warp::{http::StatusCode, Filter, Reply};

pub const SECRET: &str = "integration-test-secret";

pub const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn config(database_url: String) -> Config {
    let media_root = temp_dir().join("foodgram-tests");
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some(database_url.clone()),
        "FOODGRAM_SECRET" => Some(SECRET.to_string()),
        "FOODGRAM_MEDIA_ROOT" => Some(media_root.display().to_string()),
        _ => None,
    })
    .expect("test config")
}

/// State whose pool never connects; good for requests rejected before any query.
#[allow(dead_code, reason = "not every test file needs it")]
pub fn offline_state() -> State {
    let config = config("postgres://foodgram@localhost/unused".to_string());
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    State::new(pool, config)
}

/// Connects, migrates and empties the database named by `DATABASE_URL`.
#[allow(dead_code, reason = "not every test file needs it")]
pub async fn setup() -> State {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must name a scratch postgres database");

    let state = State::connect(config(database_url)).await.expect("connect");
    sqlx::migrate!("./migrations")
        .run(&state.pool)
        .await
        .expect("migrate");
    sqlx::query("TRUNCATE users, tags, ingredients, recipes RESTART IDENTITY CASCADE")
        .execute(&state.pool)
        .await
        .expect("truncate");

    state
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: warp::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("utf-8 body")
    }
}

pub async fn call<F>(
    api: &F,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: Reply + Send,
{
    let mut request = warp::test::request().method(method).path(path);
    if let Some(token) = token {
        request = request.header("authorization", format!("Token {token}"));
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.reply(api).await;
    TestResponse {
        status: response.status(),
        headers: response.headers().clone(),
        body: response.body().to_vec(),
    }
}

/// Registers a user and returns its id and token.
#[allow(dead_code, reason = "not every test file needs it")]
pub async fn user<F>(api: &F, username: &str) -> (i64, String)
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: Reply + Send,
{
    let email = format!("{username}@example.com");
    let created = call(
        api,
        "POST",
        "/api/users/",
        None,
        Some(json!({
            "email": email,
            "username": username,
            "first_name": "Test",
            "last_name": "Cook",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());

    let login = call(
        api,
        "POST",
        "/api/auth/token/login/",
        None,
        Some(json!({ "email": email, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.text());

    let id = created.json()["id"].as_i64().expect("user id");
    let token = login.json()["auth_token"]
        .as_str()
        .expect("auth token")
        .to_string();
    (id, token)
}
