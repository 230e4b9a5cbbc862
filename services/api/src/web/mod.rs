pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, post, put},
    Router,
};
use rest::{
    clear_history_handler, command_handler, create_session_handler, delete_session_handler,
    health_handler, history_handler, notes_handler, quiz_handler, related_handler,
    restudy_handler, set_api_key_handler, study_handler, submit_quiz_handler,
};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Builds the REST routes over the shared state. CORS and the Swagger UI are
/// layered on by the server binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{session_id}", delete(delete_session_handler))
        .route("/sessions/{session_id}/api-key", put(set_api_key_handler))
        .route("/sessions/{session_id}/commands", post(command_handler))
        .route("/sessions/{session_id}/study", post(study_handler))
        .route("/sessions/{session_id}/quiz", post(quiz_handler))
        .route("/sessions/{session_id}/quiz/submit", post(submit_quiz_handler))
        .route("/sessions/{session_id}/notes", post(notes_handler))
        .route("/sessions/{session_id}/related", get(related_handler))
        .route(
            "/sessions/{session_id}/history",
            get(history_handler).delete(clear_history_handler),
        )
        .route(
            "/sessions/{session_id}/history/{index}/restudy",
            post(restudy_handler),
        )
        .with_state(app_state)
}

/// CORS for the configured browser origin.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
}
