use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tally::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let cors = config.server.cors_allowed_origins.clone();
    let state = tally::api::create_app_state(&config)
        .await
        .expect("Failed to create app state");
    tally::api::router(state, &cors)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn login_as(app: &Router, username: &str, email: &str) -> String {
    let register = serde_json::json!({
        "username": username,
        "email": email,
        "password": "password123",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/register")
                .header("Content-Type", "application/json")
                .body(Body::from(register.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let login = serde_json::json!({ "email": email, "password": "password123" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/login")
                .header("Content-Type", "application/json")
                .body(Body::from(login.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}

fn calc_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_calculation_crud_round_trip() {
    let app = spawn_app().await;
    let token = login_as(&app, "alice", "alice@example.com").await;

    // Create: 10 + 5 = 15
    let response = app
        .clone()
        .oneshot(calc_request(
            "POST",
            "/calculations",
            &token,
            serde_json::json!({ "type": "Add", "a": 10, "b": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], "Add");
    assert_eq!(body["result"], 15);
    let id = body["id"].as_i64().unwrap();

    // Read it back
    let response = app
        .clone()
        .oneshot(get_request(&format!("/calculations/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"], 15);

    // Update: 20 * 5 = 100, result is recomputed
    let response = app
        .clone()
        .oneshot(calc_request(
            "PUT",
            &format!("/calculations/{id}"),
            &token,
            serde_json::json!({ "type": "Multiply", "a": 20, "b": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], "Multiply");
    assert_eq!(body["result"], 100);

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/calculations/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    // Gone now
    let response = app
        .clone()
        .oneshot(get_request(&format!("/calculations/{id}"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_division_and_divide_by_zero() {
    let app = spawn_app().await;
    let token = login_as(&app, "bob", "bob@example.com").await;

    let response = app
        .clone()
        .oneshot(calc_request(
            "POST",
            "/calculations",
            &token,
            serde_json::json!({ "type": "Divide", "a": 7, "b": -2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"], -3);

    // Division by zero is rejected and nothing is stored
    let response = app
        .clone()
        .oneshot(calc_request(
            "POST",
            "/calculations",
            &token,
            serde_json::json!({ "type": "Divide", "a": 1, "b": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());

    let response = app
        .clone()
        .oneshot(get_request("/calculations", &token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_operation_type_rejected() {
    let app = spawn_app().await;
    let token = login_as(&app, "carol", "carol@example.com").await;

    let response = app
        .clone()
        .oneshot(calc_request(
            "POST",
            "/calculations",
            &token,
            serde_json::json!({ "type": "Modulo", "a": 1, "b": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Invalid calculation type")
    );
}

#[tokio::test]
async fn test_overflow_rejected() {
    let app = spawn_app().await;
    let token = login_as(&app, "dave", "dave@example.com").await;

    let response = app
        .clone()
        .oneshot(calc_request(
            "POST",
            "/calculations",
            &token,
            serde_json::json!({ "type": "Add", "a": i64::MAX, "b": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_with_skip_and_limit() {
    let app = spawn_app().await;
    let token = login_as(&app, "erin", "erin@example.com").await;

    for i in 0..5 {
        let response = app
            .clone()
            .oneshot(calc_request(
                "POST",
                "/calculations",
                &token,
                serde_json::json!({ "type": "Add", "a": i, "b": 1 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_request("/calculations?skip=1&limit=2", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Insertion order, offset by one
    assert_eq!(items[0]["a"], 1);
    assert_eq!(items[1]["a"], 2);

    // Limit bounds are enforced
    let response = app
        .clone()
        .oneshot(get_request("/calculations?limit=0", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get_request("/calculations?limit=5000", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculations_are_owner_scoped() {
    let app = spawn_app().await;
    let alice = login_as(&app, "alice2", "alice2@example.com").await;
    let mallory = login_as(&app, "mallory", "mallory@example.com").await;

    let response = app
        .clone()
        .oneshot(calc_request(
            "POST",
            "/calculations",
            &alice,
            serde_json::json!({ "type": "Subtract", "a": 9, "b": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["id"].as_i64().unwrap();

    // Another user cannot see, modify, or delete it. The record's existence
    // is not disclosed, so every path reports 404.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/calculations/{id}"), &mallory))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(calc_request(
            "PUT",
            &format!("/calculations/{id}"),
            &mallory,
            serde_json::json!({ "type": "Add", "a": 0, "b": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/calculations/{id}"))
                .header("Authorization", format!("Bearer {mallory}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Owner still has it, other user's list is empty
    let response = app
        .clone()
        .oneshot(get_request(&format!("/calculations/{id}"), &alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/calculations", &mallory))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_query_and_path_params_return_json_error() {
    let app = spawn_app().await;
    let token = login_as(&app, "gwen", "gwen@example.com").await;

    // Non-numeric pagination parameter
    let response = app
        .clone()
        .oneshot(get_request("/calculations?limit=abc", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());

    // Non-numeric calculation id
    let response = app
        .clone()
        .oneshot(get_request("/calculations/abc", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}
