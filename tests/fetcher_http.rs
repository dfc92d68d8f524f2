// tests/fetcher_http.rs
//
// The real fetcher against a local stub endpoint (no external network).

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use co2_reading::config::{ApiCredential, Settings};
use co2_reading::fetcher::{fetch_reading, OpenAiFetcher, ReadingProvider};
use co2_reading::FetchError;
use serde_json::{json, Value};

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    auth: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<Value>>>,
}

async fn respond(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *stub.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *stub.body.lock().unwrap() = Some(body);
    (stub.status, Json(stub.reply.clone()))
}

/// Start a stub on an ephemeral port answering every POST with `status` + `reply`.
async fn spawn_stub(status: StatusCode, reply: Value) -> (String, Stub) {
    let stub = Stub {
        status,
        reply,
        auth: Arc::new(Mutex::new(None)),
        body: Arc::new(Mutex::new(None)),
    };
    let app = Router::new()
        .route("/v1/responses", post(respond))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1/responses"), stub)
}

fn fetcher(endpoint: String, key: &str) -> OpenAiFetcher {
    let settings = Settings {
        endpoint,
        model: "test-model".into(),
        ..Settings::default()
    };
    OpenAiFetcher::new(ApiCredential::new(key), &settings).unwrap()
}

#[tokio::test]
async fn success_sends_bearer_and_schema_and_normalizes() {
    let reply = json!({
        "output": [{ "type": "message", "content": [
            { "type": "output_json", "json": {
                "ppm": 421.3,
                "source": "https://example.org/co2",
                "timestamp": "2024-05-01T00:00:00Z"
            }}
        ]}]
    });
    let (endpoint, stub) = spawn_stub(StatusCode::OK, reply).await;

    let r = fetch_reading(&fetcher(endpoint, "sk-test")).await.unwrap();
    assert_eq!(r.concentration, 421.3);
    assert_eq!(r.timestamp, "2024-05-01T00:00:00Z");

    assert_eq!(stub.auth.lock().unwrap().as_deref(), Some("Bearer sk-test"));
    let body = stub.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["input"][0]["role"], "user");
    assert_eq!(
        body["text"]["format"]["schema"]["required"],
        json!(["ppm", "source", "timestamp"])
    );
}

#[tokio::test]
async fn non_success_status_is_request_error_with_body() {
    let (endpoint, _stub) = spawn_stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "rate limited" } }),
    )
    .await;

    match fetcher(endpoint, "sk-test").fetch_raw().await {
        Err(FetchError::Request { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credential_never_reaches_the_endpoint() {
    let (endpoint, stub) = spawn_stub(StatusCode::OK, json!({})).await;

    let err = fetch_reading(&fetcher(endpoint, "")).await.unwrap_err();
    assert!(matches!(err, FetchError::Auth));
    assert!(stub.body.lock().unwrap().is_none());
}
