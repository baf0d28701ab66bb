// Copyright 2026 The Ollama Relay Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface: route table, auth gate, and the handlers that delegate to
// the upstream client and the relay pipeline.
//
// Responsibilities:
// - Exact-equality x-api-key check before any upstream call
// - One generic buffered handler parameterized by a RouteSpec
// - Streaming handler wiring upstream -> framer -> decoder -> relay body
// - Health endpoint, permissive CORS

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::models::ModelName;
use crate::prompt;
use crate::stream;
use crate::upstream::{GenerateRequest, UpstreamClient, UpstreamError};

/// Header carrying the caller's shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: Arc<dyn UpstreamClient>,
}

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

/// Per-route configuration: which model answers and under which JSON field
/// the reply is returned.
#[derive(Debug, Clone, Copy)]
struct RouteSpec {
    name: &'static str,
    model: ModelName,
    reply_field: &'static str,
}

const NUTRITION: RouteSpec = RouteSpec {
    name: "nutrition",
    model: ModelName::Llama32Vision,
    reply_field: "result",
};

const HOME_ASSISTANT: RouteSpec = RouteSpec {
    name: "home-assistant",
    model: ModelName::Llama32Vision,
    reply_field: "reply",
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueryBody {
    query: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamQueryBody {
    query: String,
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    character_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth gate
// ---------------------------------------------------------------------------

/// Compare the presented key with the configured one; reject with a fixed
/// 403 payload on mismatch. Runs before any handler, so a rejected request
/// never reaches the upstream.
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if presented != Some(state.config.api_key.as_str()) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Forbidden: Invalid API key"})),
        )
            .into_response();
    }

    next.run(request).await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn nutrition(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Response {
    run_buffered(&state, NUTRITION, body.query).await
}

async fn home_assistant(State(state): State<AppState>, Json(body): Json<MessageBody>) -> Response {
    let rendered = prompt::home_assistant(&body.message);
    run_buffered(&state, HOME_ASSISTANT, rendered).await
}

async fn generic_ai(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Response {
    let spec = RouteSpec {
        name: "ai",
        model: state.config.generic_model,
        reply_field: "result",
    };
    run_buffered(&state, spec, body.query).await
}

/// Buffered request/response cycle, shared by all non-streaming routes.
async fn run_buffered(state: &AppState, route: RouteSpec, prompt: String) -> Response {
    let request_id = Uuid::new_v4();
    let model = route.model.backend_id();
    let started = Instant::now();

    tracing::debug!(%request_id, route = route.name, model, "forwarding buffered generate");

    let request = GenerateRequest {
        model: model.to_string(),
        prompt,
    };

    match state.upstream.generate(request).await {
        Ok(text) => {
            tracing::info!(
                %request_id,
                route = route.name,
                model,
                latency_ms = started.elapsed().as_secs_f64() * 1000.0,
                "buffered generate complete"
            );
            let mut reply = serde_json::Map::new();
            reply.insert(
                route.reply_field.to_string(),
                serde_json::Value::String(text),
            );
            (StatusCode::OK, Json(serde_json::Value::Object(reply))).into_response()
        }
        Err(e) => {
            tracing::error!(
                %request_id,
                route = route.name,
                model,
                error = %e,
                "upstream generate failed"
            );
            upstream_error_response(&e)
        }
    }
}

async fn ai_stream(State(state): State<AppState>, Json(body): Json<StreamQueryBody>) -> Response {
    let request_id = Uuid::new_v4();
    let model = state.config.generic_model.backend_id();
    let rendered = prompt::streaming(
        &body.query,
        body.system_prompt.as_deref(),
        body.character_name.as_deref(),
    );

    tracing::debug!(%request_id, route = "ai-stream", model, "opening upstream stream");

    let request = GenerateRequest {
        model: model.to_string(),
        prompt: rendered,
    };

    match state.upstream.generate_stream(request).await {
        Ok(bytes) => {
            tracing::info!(%request_id, route = "ai-stream", model, "streaming response started");
            let body = stream::relay_body(stream::events(stream::records(bytes)));
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .header(header::CACHE_CONTROL, "no-cache")
                .body(body)
                .unwrap()
        }
        Err(e) => {
            // Nothing has been written yet, so a structured error is still
            // possible here.
            tracing::error!(
                %request_id,
                route = "ai-stream",
                model,
                error = %e,
                "upstream stream failed to open"
            );
            upstream_error_response(&e)
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

fn upstream_error_response(err: &UpstreamError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Ollama request failed",
            "details": err.to_string(),
        })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the router with all API routes behind the auth gate and the health
/// endpoint outside it. The upstream client is injected.
pub fn build_router(config: Arc<Config>, upstream: Arc<dyn UpstreamClient>) -> Router {
    let state = AppState { config, upstream };

    Router::new()
        .route("/api/nutrition", post(nutrition))
        .route("/api/home-assistant", post(home_assistant))
        .route("/api/ai", post(generic_ai))
        .route("/api/ai/stream", post(ai_stream))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
