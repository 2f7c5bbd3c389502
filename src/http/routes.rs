use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:session_id", get(handlers::get_session))
        .route("/sessions/:session_id/start", post(handlers::start_session))
        .route("/sessions/:session_id/end", post(handlers::end_session))
        // Live attach (observer + input)
        .route("/sessions/:session_id/ws", get(ws::session_ws))
        // Transcript and summary
        .route(
            "/sessions/:session_id/transcripts",
            post(handlers::add_transcript),
        )
        .route(
            "/sessions/:session_id/transcript",
            get(handlers::get_transcript),
        )
        .route("/sessions/:session_id/summary", get(handlers::get_summary))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
