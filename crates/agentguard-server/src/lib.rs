//! agentguard Server
//!
//! HTTP service in front of the moderation pipeline.
//!
//! ## Endpoints
//!
//! - `GET /health` - liveness
//! - `GET /metrics` - Prometheus exposition
//! - `GET /v1/stats` - decision counters and audit size
//! - `POST /v1/moderate/text` - `{"text": ...}`
//! - `POST /v1/validate/action` - `{"kind": ..., "params": {...}}`
//! - `POST /v1/moderate/image` - `{"path": ...}`
//! - `POST /v1/actions/extract` - `{"response": ...}`, extract, validate and
//!   simulate the action in an agent reply
//!
//! Moderation endpoints answer `200` with the decision whether or not it
//! blocks. Malformed bodies get `400`. When a bearer token is configured,
//! `/v1/*` routes require it.

pub mod config;
pub mod routes;
pub mod security;
pub mod state;

pub use config::{AppConfig, ConfigOverrides, DEFAULT_CONFIG_PATH};
pub use routes::{create_router, AppError};
pub use security::{validate_endpoint_url, EndpointPolicy, SecurityError};
pub use state::{build_guardrails, AppState};
