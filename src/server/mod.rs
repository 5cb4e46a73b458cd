//! HTTP API for sessions and the prompt engine service
//!
//! Errors are returned as `{"detail": "..."}` with the status from
//! [`StackError::status_code`].

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{info, warn};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::config::{Config, ServerConfig};
use crate::domain::StackSession;
use crate::error::{Result, StackError};
use crate::service::{
    PromptEngineGetRequest, PromptEngineResponse, PromptEngineService, PromptEngineSetRequest, SessionCreateRequest,
    SessionService,
};
use crate::stack::DefaultStackFactory;
use crate::store::PromptStore;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for StackError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

impl From<QueryRejection> for StackError {
    fn from(rejection: QueryRejection) -> Self {
        StackError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for StackError {
    fn from(rejection: JsonRejection) -> Self {
        StackError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for StackError {
    fn from(rejection: PathRejection) -> Self {
        StackError::InvalidRequest(rejection.body_text())
    }
}

struct AppState {
    prompt_engine: PromptEngineService,
    sessions: SessionService,
    start_time: Instant,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    version: &'static str,
}

/// Prompt engine HTTP server
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(prompt_engine: PromptEngineService, sessions: SessionService) -> Self {
        Self {
            state: Arc::new(AppState {
                prompt_engine,
                sessions,
                start_time: Instant::now(),
            }),
        }
    }

    /// Open the configured store and wire the services over it
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(PromptStore::open(&config.storage.database)?);
        let factory = Arc::new(DefaultStackFactory::new()?);
        Ok(Self::new(
            PromptEngineService::new(store.clone(), factory, config.stack_config()),
            SessionService::new(store),
        ))
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/session", get(list_sessions_handler).post(create_session_handler))
            .route("/api/session/{id}", get(get_session_handler))
            .route(
                "/api/prompt-engine/prompt",
                get(get_prompt_handler).post(set_prompt_handler),
            )
            .with_state(self.state.clone())
    }

    /// Serve until the process is stopped
    pub async fn start(&self, server: &ServerConfig) -> Result<()> {
        let addr = server.addr();
        let listener = TcpListener::bind(&addr).await?;
        info!("Prompt engine API listening on http://{}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run a storage-backed call on the blocking pool
async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state)).await?
}

async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SessionCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StackSession>)> {
    let Json(body) = body?;
    let session = blocking(&state, move |s| s.sessions.create_session(&body)).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn list_sessions_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StackSession>>> {
    Ok(Json(blocking(&state, |s| s.sessions.list_sessions()).await?))
}

async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<StackSession>> {
    let Path(id) = id?;
    Ok(Json(blocking(&state, move |s| s.sessions.get_session(id)).await?))
}

async fn get_prompt_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<PromptEngineGetRequest>, QueryRejection>,
) -> Result<Json<PromptEngineResponse>> {
    let Query(params) = params?;
    Ok(Json(blocking(&state, move |s| s.prompt_engine.get_prompt(&params)).await?))
}

async fn set_prompt_handler(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<PromptEngineSetRequest>, JsonRejection>,
) -> Result<Json<PromptEngineResponse>> {
    let Json(body) = body?;
    Ok(Json(blocking(&state, move |s| s.prompt_engine.set_prompt(&body)).await?))
}
