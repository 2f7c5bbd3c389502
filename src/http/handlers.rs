use super::state::AppState;
use crate::session::{AiMember, Personality, Session, SessionCoordinator, TranscriptUnit};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Optional session title
    pub title: Option<String>,

    /// Configured total duration in seconds (0 = unbounded)
    pub duration_seconds: Option<u32>,

    /// Enable phase-based facilitation from the start
    #[serde(default)]
    pub facilitation_enabled: bool,

    /// AI participants for this session
    #[serde(default)]
    pub ai_members: Vec<AiMemberSpec>,
}

#[derive(Debug, Deserialize)]
pub struct AiMemberSpec {
    pub name: String,
    pub personality: Personality,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AddTranscriptRequest {
    pub text: String,

    /// Elapsed-time offset; defaults to the session's current elapsed time
    pub offset_secs: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a session and its coordinator
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let ai_members: Vec<AiMember> = req
        .ai_members
        .into_iter()
        .map(|spec| AiMember {
            id: format!("member-{}", uuid::Uuid::new_v4()),
            name: spec.name,
            personality: spec.personality,
            active: spec.active,
        })
        .collect();

    let mut session = Session::new(
        req.title.unwrap_or_else(|| "Untitled session".to_string()),
        req.duration_seconds.unwrap_or(0),
        ai_members,
    );
    session.facilitation_enabled = req.facilitation_enabled;

    if let Err(e) = state.collaborators.store.create_session(session.clone()).await {
        error!("Failed to create session record: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to create session: {}", e),
            }),
        )
            .into_response();
    }

    let coordinator = SessionCoordinator::new(
        session.clone(),
        (*state.config).clone(),
        state.collaborators.clone(),
    );

    // Mirror this session's events to NATS when configured.
    if let Some(nats) = &state.nats {
        nats.spawn_mirror(session.id.clone(), coordinator.subscribe());
    }

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session.id.clone(), coordinator);
    }

    info!("Created session {}", session.id);

    (StatusCode::OK, Json(session)).into_response()
}

/// GET /sessions/:session_id
/// Current session record (live state if running, store otherwise)
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    {
        let sessions = state.sessions.read().await;
        if let Some(coordinator) = sessions.get(&session_id) {
            let session = coordinator.session_snapshot().await;
            return (StatusCode::OK, Json(session)).into_response();
        }
    }

    match state.collaborators.store.get_session(&session_id).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session)).into_response(),
        Ok(None) => not_found(&session_id),
        Err(e) => {
            error!("Failed to read session {}: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to read session: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /sessions/:session_id/start
/// Explicit idle → active transition (idempotent)
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let coordinator = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match coordinator {
        Some(coordinator) => {
            coordinator.start().await;
            let session = coordinator.session_snapshot().await;
            (StatusCode::OK, Json(session)).into_response()
        }
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/end
/// Explicit end-of-session signal
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let coordinator = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match coordinator {
        Some(coordinator) => {
            coordinator.end().await;
            info!("Session {} ended", session_id);
            let session = coordinator.session_snapshot().await;
            (StatusCode::OK, Json(session)).into_response()
        }
        None => not_found(&session_id),
    }
}

/// POST /sessions/:session_id/transcripts
/// Manual transcript entry
pub async fn add_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<AddTranscriptRequest>,
) -> impl IntoResponse {
    let coordinator = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match coordinator {
        Some(coordinator) => {
            match coordinator
                .add_manual_transcript(req.text, req.offset_secs)
                .await
            {
                Some(unit) => (StatusCode::OK, Json(unit)).into_response(),
                None => (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "transcript text must not be empty".to_string(),
                    }),
                )
                    .into_response(),
            }
        }
        None => not_found(&session_id),
    }
}

/// GET /sessions/:session_id/transcript
/// Accumulated transcript units, sorted by elapsed-time offset
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    {
        let sessions = state.sessions.read().await;
        if let Some(coordinator) = sessions.get(&session_id) {
            let units: Vec<TranscriptUnit> = coordinator.transcript_snapshot().await;
            return (StatusCode::OK, Json(units)).into_response();
        }
    }

    match state
        .collaborators
        .store
        .list_transcript_units(&session_id)
        .await
    {
        Ok(units) => (StatusCode::OK, Json(units)).into_response(),
        Err(e) => {
            error!("Failed to list transcripts for {}: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to list transcripts: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /sessions/:session_id/summary
/// Current running summary, if one has been generated
pub async fn get_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.collaborators.store.get_summary(&session_id).await {
        Ok(Some(summary)) => (StatusCode::OK, Json(summary)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No summary yet for session {}", session_id),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read summary for {}: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to read summary: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}
