//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Every study route is a thin mapping onto a `StudyCommand`. Lookup and
//! generation problems come back as outcomes with status 200; only unknown
//! sessions and malformed input are HTTP errors.

use crate::web::protocol::{
    ApiKeyStatus, ClientCommand, CommandResponse, CreateSessionRequest, CreateSessionResponse,
    DifficultyDto, FailureBody, FollowUp, HistoryEntryBody, HistoryQuery, LookupBody, NotesBody,
    NotesRequest, NotesStyleDto, Outcome, QuizBody, QuizRequest, RelatedBody, SetApiKeyRequest,
    StudyModeDto, StudyRequest, StudySettings, SubmitQuizRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use study_helper_core::study::StudyCommand;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        create_session_handler,
        delete_session_handler,
        set_api_key_handler,
        command_handler,
        study_handler,
        quiz_handler,
        submit_quiz_handler,
        notes_handler,
        related_handler,
        history_handler,
        clear_history_handler,
        restudy_handler,
    ),
    components(
        schemas(
            HealthResponse, CreateSessionRequest, CreateSessionResponse, SetApiKeyRequest,
            ApiKeyStatus, ClientCommand, StudyRequest, StudySettings, QuizRequest,
            SubmitQuizRequest, NotesRequest, CommandResponse, Outcome, FollowUp, LookupBody,
            QuizBody, NotesBody, RelatedBody, HistoryEntryBody, FailureBody, DifficultyDto,
            StudyModeDto, NotesStyleDto
        )
    ),
    tags(
        (name = "Study Helper API", description = "Research topics, then derive quizzes, notes and related topics.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

type HandlerError = (StatusCode, String);

fn session_not_found(id: Uuid) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("Session {} not found", id))
}

/// Runs one command against a registered session.
async fn run_command(
    app_state: &AppState,
    session_id: Uuid,
    command: StudyCommand,
) -> Result<Json<CommandResponse>, HandlerError> {
    let session = app_state
        .session(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;
    let executed = app_state.study.execute(&session, command).await;
    Ok(Json(executed.into()))
}

//=========================================================================================
// Session Handlers
//=========================================================================================

/// Report service liveness.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        sessions: app_state.session_count().await,
    })
}

/// Create a new study session.
///
/// The body is optional; when it carries an `api_key`, generation calls made
/// for this session use it.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body(content = CreateSessionRequest, description = "Optional session credential."),
    responses(
        (status = 201, description = "Session created successfully", body = CreateSessionResponse)
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let (session_id, session) = app_state.create_session(request.api_key).await;
    let has_api_key = session.lock().await.has_api_key();
    info!(%session_id, has_api_key, "study session created");
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            has_api_key,
        }),
    ))
}

/// Discard a study session and everything it holds.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    responses(
        (status = 204, description = "Session removed"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    if app_state.remove_session(session_id).await {
        info!(%session_id, "study session removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(session_id))
    }
}

/// Set or clear the session's generation credential.
#[utoipa::path(
    put,
    path = "/sessions/{session_id}/api-key",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    request_body = SetApiKeyRequest,
    responses(
        (status = 200, description = "Credential updated", body = ApiKeyStatus),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn set_api_key_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SetApiKeyRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = app_state
        .session(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;
    let mut state = session.lock().await;
    state.set_api_key(request.api_key);
    Ok(Json(ApiKeyStatus {
        has_api_key: state.has_api_key(),
    }))
}

//=========================================================================================
// Study Command Handlers
//=========================================================================================

/// Dispatch any study command.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/commands",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    request_body = ClientCommand,
    responses(
        (status = 200, description = "Command executed", body = CommandResponse),
        (status = 404, description = "Unknown session"),
        (status = 422, description = "Malformed command")
    )
)]
pub async fn command_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(command): Json<ClientCommand>,
) -> Result<impl IntoResponse, HandlerError> {
    run_command(&app_state, session_id, command.into()).await
}

/// Research a topic and run the follow-up for the chosen study mode.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/study",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    request_body = StudyRequest,
    responses(
        (status = 200, description = "Topic studied", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn study_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<StudyRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let command = ClientCommand::Study {
        topic: request.topic,
        settings: request.settings,
    };
    run_command(&app_state, session_id, command.into()).await
}

/// Generate a quiz from the current topic.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/quiz",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    request_body(content = QuizRequest, description = "Difficulty and question count."),
    responses(
        (status = 200, description = "Quiz outcome", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    payload: Option<Json<QuizRequest>>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let command = ClientCommand::Quiz {
        difficulty: request.difficulty,
        count: request.count,
    };
    run_command(&app_state, session_id, command.into()).await
}

/// Submit answers to the last quiz.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/quiz/submit",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    request_body = SubmitQuizRequest,
    responses(
        (status = 200, description = "Submission graded", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn submit_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let command = StudyCommand::SubmitQuiz {
        answers: request.answers,
    };
    run_command(&app_state, session_id, command).await
}

/// Create study notes from the current topic.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/notes",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    request_body(content = NotesRequest, description = "Notes style."),
    responses(
        (status = 200, description = "Notes outcome", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn notes_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    payload: Option<Json<NotesRequest>>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let command = ClientCommand::Notes {
        style: request.style,
    };
    run_command(&app_state, session_id, command.into()).await
}

/// Suggest topics related to the current one.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/related",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    responses(
        (status = 200, description = "Related topics", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn related_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    run_command(&app_state, session_id, StudyCommand::Related).await
}

/// List the most recently studied topics, oldest first.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/history",
    params(("session_id" = Uuid, Path, description = "The study session."), HistoryQuery),
    responses(
        (status = 200, description = "Study history", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let command = ClientCommand::History { limit: query.limit };
    run_command(&app_state, session_id, command.into()).await
}

/// Remove all study history.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}/history",
    params(("session_id" = Uuid, Path, description = "The study session.")),
    responses(
        (status = 200, description = "History cleared", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    run_command(&app_state, session_id, StudyCommand::ClearHistory).await
}

/// Study a topic from the history again.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/history/{index}/restudy",
    params(
        ("session_id" = Uuid, Path, description = "The study session."),
        ("index" = usize, Path, description = "History position, as listed.")
    ),
    request_body(content = StudySettings, description = "Mode and follow-up settings."),
    responses(
        (status = 200, description = "Topic studied", body = CommandResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn restudy_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(Uuid, usize)>,
    payload: Option<Json<StudySettings>>,
) -> Result<impl IntoResponse, HandlerError> {
    let settings = payload.map(|Json(s)| s).unwrap_or_default();
    let command = ClientCommand::Restudy { index, settings };
    run_command(&app_state, session_id, command.into()).await
}
