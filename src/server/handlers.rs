/// API Request Handlers
/// Thin request/response mapping over the backup core

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::core::{
    conf::ConfigDocument,
    info_parser,
    orchestrator::RunningProbe,
    registry::{BackupKind, Instance, InstanceUpdate},
    BackupOrchestrator, ConfigStore, Error, InstanceRegistry, LogReader,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<InstanceRegistry>,
    pub orchestrator: Arc<BackupOrchestrator>,
    pub config_store: Arc<ConfigStore>,
    pub log_reader: Arc<LogReader>,
    pub probe: Arc<dyn RunningProbe>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

/// Map core errors onto transport status codes
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Parse(_) => StatusCode::BAD_REQUEST,
        Error::Execution { .. } => StatusCode::BAD_GATEWAY,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: Error) -> Response {
    (
        status_for(&err),
        Json(ApiResponse::<()>::error(err.to_string())),
    )
        .into_response()
}

// ============================================================================
// Instance Management Handlers
// ============================================================================

pub async fn get_instances(State(state): State<AppState>) -> Response {
    Json(ApiResponse::ok(state.registry.list())).into_response()
}

pub async fn add_instance(
    State(state): State<AppState>,
    Json(instance): Json<Instance>,
) -> Response {
    match state.registry.add(instance) {
        Ok(added) => (StatusCode::CREATED, Json(ApiResponse::ok(added))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<InstanceUpdate>,
) -> Response {
    match state.registry.update(&id, update) {
        Ok(updated) => Json(ApiResponse::ok(updated)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn remove_instance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.registry.remove(&id) {
        Ok(()) => Json(ApiResponse::ok(())).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Backup Operation Handlers
// ============================================================================

pub async fn run_backup(
    State(state): State<AppState>,
    Path((id, backup_type)): Path<(String, String)>,
) -> Response {
    let kind: BackupKind = match backup_type.parse() {
        Ok(kind) => kind,
        Err(e) => return error_response(e),
    };

    match state.orchestrator.run_backup(&id, kind).await {
        Ok(stdout) => Json(ApiResponse::ok(stdout)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn run_cleanup(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.orchestrator.run_cleanup(&id).await {
        Ok(stdout) => Json(ApiResponse::ok(stdout)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn run_check(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.orchestrator.check(&id).await {
        Ok(stdout) => Json(ApiResponse::ok(stdout)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Status & History Handlers
// ============================================================================

pub async fn get_info(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.orchestrator.info(&id).await {
        Ok(text) => Json(ApiResponse::ok(text)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_history(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.orchestrator.info(&id).await {
        Ok(text) => Json(ApiResponse::ok(info_parser::parse_backup_info(&text))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.orchestrator.info(&id).await {
        Ok(text) => {
            let running = state.probe.is_backup_running(&id);
            Json(ApiResponse::ok(info_parser::backup_status(&text, running))).into_response()
        }
        // Unknown instance is the caller's mistake; anything else means the
        // info command itself failed and the instance reports as failed
        Err(e @ Error::NotFound(_)) => error_response(e),
        Err(e) => {
            tracing::error!(instance = %id, "status query failed: {}", e);
            Json(ApiResponse::ok(info_parser::BackupStatus::failed())).into_response()
        }
    }
}

// ============================================================================
// Log Handlers
// ============================================================================

#[derive(Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_tail")]
    tail: usize,
}

fn default_tail() -> usize {
    100
}

pub async fn get_logs(State(state): State<AppState>, Query(params): Query<LogsQuery>) -> Response {
    match state.log_reader.tail(params.tail) {
        Ok(lines) => Json(ApiResponse::ok(lines)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Configuration Handlers
// ============================================================================

pub async fn get_config(State(state): State<AppState>) -> Response {
    Json(ApiResponse::ok(state.config_store.load())).into_response()
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(doc): Json<ConfigDocument>,
) -> Response {
    match state.config_store.save(&doc) {
        Ok(()) => Json(ApiResponse::ok(())).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthInfo {
    status: &'static str,
    version: &'static str,
    instances: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    Json(ApiResponse::ok(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        instances: state.registry.list().len(),
    }))
    .into_response()
}
