mod common;

use common::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tripline::api::v1::{recover_error, routes};
use tripline::application_port::AuthService;
use warp::Filter;
use warp::http::StatusCode;

fn api(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    routes(auth_service).recover(recover_error)
}

async fn post(
    filter: &(impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone + 'static),
    path: &str,
    body: Value,
) -> (StatusCode, Value) {
    let response = warp::test::request()
        .method("POST")
        .path(path)
        .json(&body)
        .reply(filter)
        .await;
    let status = response.status();
    (status, serde_json::from_slice(response.body()).unwrap())
}

#[tokio::test]
async fn register_login_refresh_logout_over_http() {
    let h = Harness::new();
    let api = api(h.service.clone());

    let (status, body) = post(
        &api,
        "/register",
        json!({"username": "alice", "email": "A@X.com", "password": PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let user_id = body["data"]["user_id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &api,
        "/login",
        json!({"email": "a@x.com", "password": PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], user_id.as_str());
    let access = body["data"]["auth_tokens"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let refresh = body["data"]["auth_tokens"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = warp::test::request()
        .method("GET")
        .path("/session")
        .header("authorization", format!("Bearer {access}"))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["data"]["user_id"], user_id.as_str());

    let (status, body) = post(&api, "/refresh", json!({"refresh_token": refresh})).await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    let (status, body) = post(&api, "/refresh", json!({"refresh_token": refresh})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "InvalidCredentials");

    let (status, _) = post(&api, "/logout", json!({"refresh_token": rotated})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn conflicts_and_validation_map_to_client_errors() {
    let h = Harness::new();
    let api = api(h.service.clone());
    h.register("bob", "bob@example.com").await;

    let (status, body) = post(
        &api,
        "/register",
        json!({"username": "bob", "email": "new@example.com", "password": PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "UsernameTaken");

    let (status, body) = post(
        &api,
        "/register",
        json!({"username": "bobby", "email": "bob@example.com", "password": PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EmailTaken");

    let (status, body) = post(
        &api,
        "/register",
        json!({"username": "carol", "email": "carol@example.com", "password": "short"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidRequest");

    let (status, _) = post(&api, "/register", json!({"username": "carol"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_share_one_response() {
    let h = Harness::new();
    let api = api(h.service.clone());
    h.register("dave", "dave@example.com").await;

    let wrong_password = post(
        &api,
        "/login",
        json!({"email": "dave@example.com", "password": "wrong-password"}),
    )
    .await;
    let unknown_email = post(
        &api,
        "/login",
        json!({"email": "ghost@example.com", "password": PASSWORD}),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn session_requires_a_valid_bearer_token() {
    let h = Harness::new();
    let api = api(h.service.clone());

    let missing = warp::test::request()
        .method("GET")
        .path("/session")
        .reply(&api)
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let forged = warp::test::request()
        .method("GET")
        .path("/session")
        .header("authorization", "Bearer not.a.token")
        .reply(&api)
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let wrong_scheme = warp::test::request()
        .method("GET")
        .path("/session")
        .header("authorization", "Basic abc")
        .reply(&api)
        .await;
    assert_eq!(wrong_scheme.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let h = Harness::new();
    let api = api(h.service.clone());
    let (status, body) = post(&api, "/trips", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
