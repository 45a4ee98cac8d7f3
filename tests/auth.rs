//! Requests that are turned away before the database is consulted.

mod common;

use common::{call, offline_state, SECRET};
use foodgram::{
    jwt::generate_jwt_session,
    routes::routes,
    schema::{User, UserRole},
};
use serde_json::json;
use warp::http::{HeaderValue, StatusCode};

fn token_for(id: i32) -> String {
    let user = User {
        id,
        email: "cook@example.com".to_string(),
        username: "cook".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password: String::new(),
        role: UserRole::User,
    };
    generate_jwt_session(&user, SECRET).unwrap()
}

#[tokio::test]
async fn me_requires_a_token() {
    let api = routes(&offline_state());
    let response = call(&api, "GET", "/api/users/me/", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.json()["detail"].is_string());
}

#[tokio::test]
async fn anonymous_writes_are_rejected() {
    let api = routes(&offline_state());

    let create = call(&api, "POST", "/api/recipes/", None, Some(json!({}))).await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);

    let favorite = call(&api, "POST", "/api/recipes/1/favorite/", None, None).await;
    assert_eq!(favorite.status, StatusCode::UNAUTHORIZED);

    let download = call(&api, "GET", "/api/recipes/download_shopping_cart/", None, None).await;
    assert_eq!(download.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_token_is_rejected_even_on_public_routes() {
    let api = routes(&offline_state());
    let response = call(&api, "GET", "/api/recipes/", Some("not.a.jwt"), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let api = routes(&offline_state());
    let user = User {
        id: 1,
        email: "cook@example.com".to_string(),
        username: "cook".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password: String::new(),
        role: UserRole::User,
    };
    let token = generate_jwt_session(&user, "some-other-secret").unwrap();

    let response = call(&api, "GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cannot_follow_yourself() {
    let api = routes(&offline_state());
    let token = token_for(7);

    for method in ["POST", "DELETE"] {
        let response = call(&api, method, "/api/users/7/subscribe/", Some(&token), None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.json()["errors"].is_array());
    }
}

#[tokio::test]
async fn unknown_routes_are_json_404() {
    let api = routes(&offline_state());
    let response = call(&api, "GET", "/api/nothing/here/", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["detail"], "Not found.");
}

#[tokio::test]
async fn wrong_method_is_405() {
    let api = routes(&offline_state());
    let response = call(&api, "PUT", "/api/tags/", None, None).await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn non_utf8_authorization_is_401() {
    let api = routes(&offline_state());
    let response = warp::test::request()
        .method("GET")
        .path("/api/recipes/")
        .header("authorization", HeaderValue::from_bytes(b"Token \xff\xfe").unwrap())
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_stateless() {
    let api = routes(&offline_state());

    let anonymous = call(&api, "POST", "/api/auth/token/logout/", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let token = token_for(3);
    let response = call(&api, "POST", "/api/auth/token/logout/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn set_password_requires_a_token() {
    let api = routes(&offline_state());
    let response = call(
        &api,
        "POST",
        "/api/users/set_password/",
        None,
        Some(json!({ "current_password": "a", "new_password": "b" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
