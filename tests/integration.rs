// Integration tests
//
// End-to-end over the real router and the real reqwest upstream client:
// request -> auth gate -> OllamaClient -> framer -> decoder -> relay -> response
//
// Uses wiremock as the inference backend and tower::ServiceExt::oneshot for
// in-process HTTP.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ollama_relay::config::Config;
use ollama_relay::routes::{self, API_KEY_HEADER};
use ollama_relay::upstream::OllamaClient;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "integration-key";

// ---------------------------------------------------------------------------
// Infrastructure
// ---------------------------------------------------------------------------

fn build_app(upstream_url: &str) -> Router {
    let config = Arc::new(
        Config::new(KEY.to_string(), upstream_url.to_string(), 5, "llama3").unwrap(),
    );
    let upstream = Arc::new(OllamaClient::new(reqwest::Client::new(), &config));
    routes::build_router(config, upstream)
}

fn json_request(path_str: &str, key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path_str)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn read_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

// ---------------------------------------------------------------------------
// Buffered routes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nutrition_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3.2-vision:11b",
            "prompt": "are apples healthy?",
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Apples are rich in fiber.",
            "done": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(&server.uri());
    let resp = app
        .oneshot(json_request(
            "/api/nutrition",
            Some(KEY),
            r#"{"query":"are apples healthy?"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    assert_eq!(json["result"], "Apples are rich in fiber.");
}

#[tokio::test]
async fn home_assistant_end_to_end_renders_preamble() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3.2-vision:11b",
            "prompt": "You are a helpful AI home assistant.\nUser: turn on the lights",
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Done.",
            "done": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(&server.uri());
    let resp = app
        .oneshot(json_request(
            "/api/home-assistant",
            Some(KEY),
            r#"{"message":"turn on the lights"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    assert_eq!(json["reply"], "Done.");
}

#[tokio::test]
async fn upstream_connect_failure_yields_500_with_error_field() {
    // Nothing listens on port 1.
    let app = build_app("http://127.0.0.1:1");

    let resp = app
        .oneshot(json_request(
            "/api/nutrition",
            Some(KEY),
            r#"{"query":"q"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(resp).await;
    assert_eq!(json["error"], "Ollama request failed");
    assert!(json["details"].is_string());
    assert!(json.get("result").is_none());
}

// ---------------------------------------------------------------------------
// Auth gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_key_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_app(&server.uri());
    let resp = app
        .oneshot(json_request("/api/ai", Some("wrong"), r#"{"query":"q"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json = read_json(resp).await;
    assert_eq!(json["error"], "Forbidden: Invalid API key");

    server.verify().await;
}

// ---------------------------------------------------------------------------
// Streaming route
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_end_to_end_relays_deltas_and_tolerates_malformed_records() {
    let ndjson = "{\"response\":\"Hi\",\"done\":false}\n\
                  this line is not json\n\
                  \n\
                  {\"response\":\" there\",\"done\":false}\n\
                  {\"response\":\"\",\"done\":true}\n";

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3",
            "prompt": "say hi",
            "stream": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(&server.uri());
    let resp = app
        .oneshot(json_request(
            "/api/ai/stream",
            Some(KEY),
            r#"{"query":"say hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(read_text(resp).await, "Hi there");
}

#[tokio::test]
async fn stream_stops_at_first_done_even_if_more_records_follow() {
    let ndjson = "{\"response\":\"Hi\",\"done\":false}\n\
                  {\"response\":\"\",\"done\":true}\n\
                  {\"response\":\" ignored\",\"done\":false}\n";

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
        .mount(&server)
        .await;

    let app = build_app(&server.uri());
    let resp = app
        .oneshot(json_request(
            "/api/ai/stream",
            Some(KEY),
            r#"{"query":"say hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_text(resp).await, "Hi");
}

#[tokio::test]
async fn stream_open_failure_yields_500_json() {
    let app = build_app("http://127.0.0.1:1");

    let resp = app
        .oneshot(json_request(
            "/api/ai/stream",
            Some(KEY),
            r#"{"query":"q"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(resp).await;
    assert_eq!(json["error"], "Ollama request failed");
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn healthz_open_without_key() {
    let app = build_app("http://127.0.0.1:1");

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}
