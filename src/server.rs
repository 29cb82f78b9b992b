//! HTTP API server.
//!
//! Every session owns its own [`Orchestrator`] behind an async mutex, so
//! sessions never share conversation state and each one handles a single
//! action at a time.

use crate::config::Settings;
use crate::conversation::Turn;
use crate::error::{Result, TubecoachError};
use crate::illustration::Illustration;
use crate::orchestrator::{Orchestrator, TurnOutcome};
use crate::source::SourceKind;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Builds a fresh orchestrator for each new session.
pub type SessionFactory = Arc<dyn Fn() -> Result<Orchestrator> + Send + Sync>;

type SessionHandle = Arc<AsyncMutex<Orchestrator>>;

/// Shared application state.
pub struct AppState {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    factory: SessionFactory,
}

impl AppState {
    pub fn new(factory: SessionFactory) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
        }
    }

    fn create(&self) -> Result<Uuid> {
        let orchestrator = (self.factory)()?;
        let id = orchestrator.session_id();
        self.lock_sessions()
            .insert(id, Arc::new(AsyncMutex::new(orchestrator)));
        Ok(id)
    }

    fn get(&self, id: Uuid) -> Result<SessionHandle> {
        self.lock_sessions()
            .get(&id)
            .cloned()
            .ok_or_else(|| TubecoachError::SessionNotFound(id.to_string()))
    }

    fn remove(&self, id: Uuid) -> Option<SessionHandle> {
        self.lock_sessions().remove(&id)
    }

    /// Whether `id` still maps to this exact session.
    fn is_current(&self, id: Uuid, handle: &SessionHandle) -> bool {
        self.lock_sessions()
            .get(&id)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    /// Move `handle` from `old` to `new`, only if `old` still points at it.
    fn rekey(&self, old: Uuid, new: Uuid, handle: &SessionHandle) -> Result<()> {
        let mut sessions = self.lock_sessions();
        match sessions.get(&old) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(&old);
                sessions.insert(new, Arc::clone(handle));
                Ok(())
            }
            _ => Err(TubecoachError::SessionNotFound(old.to_string())),
        }
    }

    fn len(&self) -> usize {
        self.lock_sessions().len()
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>> {
        // A poisoned map is still consistent: every mutation is a single call.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/messages", post(send_message))
        .route("/sessions/{id}/documents", post(submit_document))
        .route("/sessions/{id}/videos", post(submit_video))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/sessions/{id}/history", get(history))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server until it is stopped.
pub async fn run(host: &str, port: u16, settings: Settings, profile: Option<String>) -> Result<()> {
    // Fail on bad settings before binding.
    Orchestrator::new(&settings, profile.as_deref())?;

    let factory: SessionFactory =
        Arc::new(move || Orchestrator::new(&settings, profile.as_deref()));
    let app = router(Arc::new(AppState::new(factory)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct MessageRequest {
    text: String,
}

#[derive(Deserialize)]
struct VideoRequest {
    /// YouTube URL or video id
    video: String,
}

#[derive(Deserialize)]
struct DocumentRequest {
    name: String,
    /// Raw file bytes, base64-encoded.
    #[serde(default)]
    content_base64: Option<String>,
    /// Plain text, when the client already has it decoded.
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
}

#[derive(Serialize)]
struct TurnResponse {
    session_id: Uuid,
    reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    illustration: Option<IllustrationPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript: Option<TranscriptInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported_transcript: Option<String>,
}

#[derive(Serialize)]
struct IllustrationPayload {
    mime_type: &'static str,
    prompt: String,
    data: String,
}

impl From<&Illustration> for IllustrationPayload {
    fn from(illustration: &Illustration) -> Self {
        Self {
            mime_type: illustration.format().mime_type(),
            prompt: illustration.prompt.clone(),
            data: illustration.to_base64(),
        }
    }
}

#[derive(Serialize)]
struct TranscriptInfo {
    id: String,
    title: Option<String>,
    kind: SourceKind,
    characters: usize,
}

#[derive(Serialize)]
struct HistoryResponse<'a> {
    session_id: Uuid,
    turns: &'a [Turn],
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl TurnResponse {
    fn new(session_id: Uuid, outcome: TurnOutcome) -> Self {
        Self {
            session_id,
            illustration: outcome.illustration.as_ref().map(IllustrationPayload::from),
            transcript: outcome.transcript.map(|t| TranscriptInfo {
                characters: t.text.chars().count(),
                id: t.id,
                title: t.title,
                kind: t.kind,
            }),
            exported_transcript: outcome
                .exported_transcript
                .map(|p| p.display().to_string()),
            reply: outcome.reply,
        }
    }
}

/// Error wrapper that renders as a JSON body with a matching status.
struct ApiError(TubecoachError);

impl From<TubecoachError> for ApiError {
    fn from(e: TubecoachError) -> Self {
        Self(e)
    }
}

fn status_for(error: &TubecoachError) -> StatusCode {
    match error {
        TubecoachError::InvalidInput(_) | TubecoachError::Decode(_) => StatusCode::BAD_REQUEST,
        TubecoachError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        TubecoachError::Acquisition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TubecoachError::Inference(_) | TubecoachError::Generation(_) | TubecoachError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "sessions": state.len() }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let session_id = state.create()?;
    info!("Created session {}", session_id);
    Ok((StatusCode::CREATED, Json(SessionResponse { session_id })))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    match state.remove(id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(TubecoachError::SessionNotFound(id.to_string()).into()),
    }
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> ApiResult<Json<TurnResponse>> {
    let handle = state.get(id)?;
    let mut orchestrator = handle.lock().await;
    let outcome = orchestrator.send_message(&req.text).await?;
    Ok(Json(TurnResponse::new(orchestrator.session_id(), outcome)))
}

async fn submit_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<DocumentRequest>,
) -> ApiResult<Json<TurnResponse>> {
    let bytes = document_bytes(&req)?;
    let handle = state.get(id)?;
    let mut orchestrator = handle.lock().await;
    let outcome = orchestrator.submit_document_bytes(&req.name, &bytes).await?;
    Ok(Json(TurnResponse::new(orchestrator.session_id(), outcome)))
}

async fn submit_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<VideoRequest>,
) -> ApiResult<Json<TurnResponse>> {
    let handle = state.get(id)?;
    let mut orchestrator = handle.lock().await;
    let outcome = orchestrator.submit_video(&req.video).await?;
    Ok(Json(TurnResponse::new(orchestrator.session_id(), outcome)))
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let handle = state.get(id)?;
    let mut orchestrator = handle.lock().await;
    // The id may have been reset or deleted while we waited for the lock.
    if !state.is_current(id, &handle) {
        return Err(TubecoachError::SessionNotFound(id.to_string()).into());
    }
    orchestrator.reset();
    let session_id = orchestrator.session_id();
    state.rekey(id, session_id, &handle)?;
    info!("Session {} reset as {}", id, session_id);
    Ok(Json(SessionResponse { session_id }))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let handle = state.get(id)?;
    let orchestrator = handle.lock().await;
    let response = Json(HistoryResponse {
        session_id: orchestrator.session_id(),
        turns: orchestrator.session().turns(),
    })
    .into_response();
    Ok(response)
}

fn document_bytes(req: &DocumentRequest) -> Result<Vec<u8>> {
    match (&req.content_base64, &req.text) {
        (Some(encoded), _) => general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| TubecoachError::InvalidInput(format!("content_base64: {}", e))),
        (None, Some(text)) => Ok(text.clone().into_bytes()),
        (None, None) => Err(TubecoachError::InvalidInput(
            "Document needs content_base64 or text".to_string(),
        )),
    }
}
