//! Router-level tests against the in-memory backend.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use backend_application::AppState;
use backend_domain::RuntimeConfig;
use backend_infrastructure::MemoryRepository;
use backend_interfaces_http::build_router;

fn test_app(api_token: Option<&str>) -> Router {
    let repo = Arc::new(MemoryRepository::new());
    let config = RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: api_token.map(str::to_string),
        max_body_bytes: 64 * 1024,
        request_timeout_seconds: 5,
    };
    build_router(AppState::new(config, repo.clone(), repo.clone(), repo))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn record_list_and_remove_detection() {
    let app = test_app(None);
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/detections",
            json!({
                "captured_date": "2024-05-01T08:30:00Z",
                "groceries": [
                    {"item_name": "Egg", "item_count": 6, "storage_location": "Fridge", "emoji": "🥚"},
                    {"item_name": "Rice", "item_count": 1, "storage_location": "Pantry"}
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["detection"]["id"].as_str().expect("id").to_string();
    assert_eq!(body["inventory"].as_array().expect("inventory").len(), 2);
    assert_eq!(body["inventory"][0]["item_name"], "Egg");
    assert_eq!(body["inventory"][1]["emoji"], "🛒");

    let (status, body) = send(&app, get("/api/detections")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inventory"][0]["item_count"], 6);

    let (status, body) = send(&app, get("/api/detections?view=events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detections"][0]["id"], id.as_str());

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/detections/{}", id))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inventory"], json!([]));

    let (_, body) = send(&app, get("/api/inventory")).await;
    assert_eq!(body["inventory"], json!([]));
}

#[tokio::test]
async fn malformed_payloads_are_bad_requests() {
    let app = test_app(None);
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/detections", json!({"groceries": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("captured_date"));

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/detections",
            json!({"captured_date": "2024-05-01T08:30:00Z", "groceries": "eggs"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/detections")
            .body(Body::from("not json"))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_unknown_detection_is_not_found() {
    let app = test_app(None);
    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/api/detections/missing-id")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().expect("error").contains("missing-id"));
}

#[tokio::test]
async fn gzip_encoded_detection_is_accepted() {
    let app = test_app(None);
    let payload = json!({
        "captured_date": 1714552200000i64,
        "groceries": [{"item_name": "Milk", "item_count": "2", "storage_location": "Fridge"}]
    });
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload.to_string().as_bytes())
        .expect("compress");
    let compressed = encoder.finish().expect("finish");

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/detections")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_ENCODING, "gzip")
            .body(Body::from(compressed))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["inventory"][0]["item_count"], 2);
}

#[tokio::test]
async fn token_guards_api_but_not_health() {
    let app = test_app(Some("s3cret"));
    let (status, body) = send(&app, get("/api/inventory")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/api/inventory")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/api/ops/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/ops/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn recipes_are_ranked_by_nutrition() {
    let app = test_app(None);
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/recipes/rank",
            json!({"recipes": [
                {"name": "toast", "nutrition": {"score": 2}},
                {"name": "salad", "nutrition": {"score": "8.5"}},
                {"name": "mystery"}
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names = body["recipes"]
        .as_array()
        .expect("recipes")
        .iter()
        .map(|r| r["name"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["salad", "toast", "mystery"]);

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/recipes/rank", json!({"name": "toast"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected a list of recipes");
}

#[tokio::test]
async fn metrics_count_recorded_detections() {
    let app = test_app(None);
    send(
        &app,
        json_request(
            Method::POST,
            "/api/detections",
            json!({"captured_date": "2024-05-01T08:30:00Z", "groceries": []}),
        ),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get("/api/ops/metrics/prometheus"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains("larder_detections_recorded_total 1"));
}
