//! MCP-compatible HTTP server.
//!
//! Exposes the FAQ corpus via a JSON HTTP API so an agent orchestration
//! layer can call `search_faq` as a tool.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (version, corpus state) |
//! | `GET`  | `/faq?q=...&mode=...` | Search the corpus directly |
//! | `GET`  | `/tools/list` | List registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a registered tool by name |
//! | `POST` | `/corpus/refresh` | Re-fetch the source page and rebuild the cache |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `fetch_error` (502),
//! `tool_error` (500).
//!
//! Searches never produce an error response: an unreachable source page
//! yields `200` with an empty `results` array.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{Config, MatchMode};
use crate::faq::FaqService;
use crate::models::SearchResponse;
use crate::tools::{ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<FaqService>,
    tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(service: Arc<FaqService>, tools: ToolRegistry) -> Self {
        Self {
            service,
            tools: Arc::new(tools),
        }
    }
}

/// Build the router with CORS open to all origins.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/faq", get(handle_faq))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/corpus/refresh", post(handle_refresh))
        .layer(cors)
        .with_state(state)
}

/// Starts the server on `[server].bind` with the built-in tools.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(FaqService::from_config(config)?);
    run_server_with_service(&config.server.bind, service, ToolRegistry::with_builtins()).await
}

/// Starts the server around an existing service and tool registry.
///
/// Custom [`Tool`](crate::tools::Tool) implementations registered in `tools`
/// appear in `GET /tools/list` next to the built-ins.
pub async fn run_server_with_service(
    bind: &str,
    service: Arc<FaqService>,
    tools: ToolRegistry,
) -> anyhow::Result<()> {
    for t in tools.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "rust" };
        info!(tool = t.name(), kind = tag, "registered tool");
    }

    let app = router(AppState::new(service, tools));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "FAQ server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// 502: the upstream FAQ page could not be fetched.
fn fetch_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "fetch_error".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

/// Maps tool failures onto HTTP statuses by message so tools can signal
/// client errors without a custom error type in the `Tool` trait.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if err.downcast_ref::<crate::error::FetchError>().is_some() {
        fetch_error(format!("{}: {}", tool_name, msg))
    } else if msg.contains("must not be empty") || msg.contains("invalid") || msg.contains("Unknown") {
        bad_request(format!("{}: {}", tool_name, msg))
    } else {
        tool_error(format!("{}: {}", tool_name, msg))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    corpus_loaded: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        corpus_loaded: state.service.store().is_loaded(),
    })
}

// ============ GET /faq ============

#[derive(Deserialize)]
struct FaqParams {
    #[serde(default)]
    q: String,
    mode: Option<String>,
}

/// Handler for `GET /faq`.
///
/// A blank `q` is a valid search that returns no results. Only an unknown
/// `mode` is rejected.
async fn handle_faq(
    State(state): State<AppState>,
    Query(params): Query<FaqParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let mode = match params.mode.as_deref() {
        Some(m) => m
            .parse::<MatchMode>()
            .map_err(|e| bad_request(e.to_string()))?,
        None => MatchMode::Citation,
    };
    Ok(Json(state.service.search(&params.q, mode).await))
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.infos(),
    })
}

// ============ POST /tools/{name} ============

/// Handler for `POST /tools/{name}`.
///
/// Returns `404` for an unknown tool, `400` for parameter errors, `502` when
/// the source page is unreachable and `500` for any other failure.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    if !params.is_object() {
        return Err(bad_request("invalid params: expected a JSON object"));
    }

    let ctx = ToolContext::new(state.service.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

// ============ POST /corpus/refresh ============

#[derive(Serialize)]
struct RefreshResponse {
    entries: usize,
}

async fn handle_refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let index = state
        .service
        .store()
        .refresh()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;
    Ok(Json(RefreshResponse {
        entries: index.len(),
    }))
}
