//! HTTP control surface: health, pause/resume, manual post, trigger-now.
//! Mutating routes are gated by a shared-secret token passed as a query
//! parameter and compared by exact string match.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::publish::PublishError;
use crate::scheduler::{PostOutcome, Scheduler};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub control_token: Arc<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/manual/tweet", post(manual_post))
        .route("/trigger", get(trigger).post(trigger))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiReply = (StatusCode, Json<Value>);

fn authorized(state: &AppState, q: &HashMap<String, String>) -> bool {
    q.get("token").map(String::as_str) == Some(state.control_token.as_str())
}

fn unauthorized() -> ApiReply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized" })),
    )
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "automation_enabled": state.scheduler.is_enabled(),
    }))
}

async fn pause(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> ApiReply {
    if !authorized(&state, &q) {
        return unauthorized();
    }
    state.scheduler.pause();
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

async fn resume(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> ApiReply {
    if !authorized(&state, &q) {
        return unauthorized();
    }
    state.scheduler.resume();
    (StatusCode::OK, Json(json!({ "status": "resumed" })))
}

#[derive(serde::Deserialize)]
struct ManualPostReq {
    #[serde(default)]
    text: String,
}

async fn manual_post(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
    Json(body): Json<ManualPostReq>,
) -> ApiReply {
    if !authorized(&state, &q) {
        return unauthorized();
    }
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "text must be non-empty" })),
        );
    }
    outcome_reply(state.scheduler.publish_raw(text).await)
}

async fn trigger(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> ApiReply {
    if !authorized(&state, &q) {
        return unauthorized();
    }
    outcome_reply(state.scheduler.trigger_now().await)
}

fn outcome_reply(outcome: PostOutcome) -> ApiReply {
    match outcome {
        PostOutcome::Published(text) => (
            StatusCode::OK,
            Json(json!({ "status": "published", "text": text })),
        ),
        PostOutcome::Duplicate(text) => (
            StatusCode::OK,
            Json(json!({ "status": "duplicate", "text": text })),
        ),
        PostOutcome::Failed { error, .. } => (
            publish_error_status(&error),
            Json(json!({ "status": "failed", "error": error.to_string() })),
        ),
    }
}

fn publish_error_status(error: &PublishError) -> StatusCode {
    match error {
        PublishError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        PublishError::Auth => StatusCode::BAD_GATEWAY,
        PublishError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PublishError::Transient(_) => StatusCode::BAD_GATEWAY,
    }
}
