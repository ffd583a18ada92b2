//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::security::{bearer_token, tokens_match};
use crate::state::AppState;
use agentguard_core::{ActionRequest, ModerationDecision};
use agentguard_policy::ResponseOutcome;
use agentguard_telemetry::MetricsSnapshot;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/moderate/text", post(moderate_text))
        .route("/v1/validate/action", post(validate_action))
        .route("/v1/moderate/image", post(moderate_image))
        .route("/v1/actions/extract", post(extract_action))
        .route("/v1/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .merge(api)
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.auth_token.as_deref() {
        let authorized = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .is_some_and(|token| tokens_match(token, expected));

        if !authorized {
            warn!(path = %request.uri().path(), "Rejected request without valid bearer token");
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    text: String,
}

async fn moderate_text(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<ModerationDecision>, AppError> {
    let Json(req) = body?;
    Ok(Json(state.guardrails.moderate_text(&req.text).await))
}

async fn validate_action(
    State(state): State<AppState>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ModerationDecision>, AppError> {
    let Json(action) = body?;
    debug!(kind = %action.kind, "Validating action");
    Ok(Json(state.guardrails.validate_action(&action).await))
}

#[derive(Debug, Deserialize)]
struct ImageRequest {
    path: PathBuf,
}

async fn moderate_image(
    State(state): State<AppState>,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ModerationDecision>, AppError> {
    let Json(req) = body?;
    let path = resolve_image_path(state.image_root.as_deref(), &req.path).await?;
    Ok(Json(state.guardrails.moderate_image(&path).await))
}

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    response: String,
}

async fn extract_action(
    State(state): State<AppState>,
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ResponseOutcome>, AppError> {
    let Json(req) = body?;
    Ok(Json(state.guardrails.process_response(&req.response).await))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    decisions: MetricsSnapshot,
    block_rate: f64,
    avg_classifier_latency_us: f64,
    audit_records: u64,
    rules_version: String,
    confidence_threshold: f32,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let decisions = state.guardrails.metrics().snapshot();
    Json(StatsResponse {
        block_rate: decisions.block_rate(),
        avg_classifier_latency_us: decisions.avg_classifier_latency_us(),
        decisions,
        audit_records: state.guardrails.audit().len(),
        rules_version: state.guardrails.engine().rules_version().to_string(),
        confidence_threshold: state.guardrails.engine().threshold(),
    })
}

async fn fallback() -> AppError {
    AppError::NotFound
}

/// Resolve `requested` under `root`, refusing paths that escape it
async fn resolve_image_path(root: Option<&Path>, requested: &Path) -> Result<PathBuf, AppError> {
    let Some(root) = root else {
        return Ok(requested.to_path_buf());
    };

    let outside = || {
        AppError::InvalidRequest(format!(
            "image path {} is not a readable file under the image root",
            requested.display()
        ))
    };

    let root = tokio::fs::canonicalize(root).await.map_err(|_| outside())?;
    let candidate = tokio::fs::canonicalize(root.join(requested))
        .await
        .map_err(|_| outside())?;

    if candidate.starts_with(&root) {
        Ok(candidate)
    } else {
        Err(outside())
    }
}

/// Request-level errors. Moderation outcomes are never errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("not found")]
    NotFound,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        };

        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
