//! Axum Handlers for the REST API
//!
//! Each page session wraps one `AdvisorController`. The handlers translate
//! page actions (typed messages, suggested-prompt shortcuts, locale switches,
//! resets and credential reconnection) into controller calls, then return the
//! rendered session together with any view hints the cycle emitted.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shield_advisor_core::content::content;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{
        ChangeLocalePayload, CreateSessionPayload, ErrorResponse, PromptsQuery, ReconnectPayload,
        SessionView, SubmitMessagePayload, SubmitResponse, SuggestedPromptView,
        TriggerPromptPayload,
    },
    session::PageSession,
    state::AppState,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<PageSession>, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session with id '{}' not found", id)))
}

/// Create a new advisor session, seeded with the locale's greeting.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionPayload,
    responses(
        (status = 201, description = "Session created successfully", body = SessionView),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = payload.locale.unwrap_or(state.config.default_locale);
    let connected = state.credential.is_selected();
    let session = state
        .sessions
        .create(locale, state.llm_client.clone(), connected)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(session.render(state.credential.is_selected()).await),
    ))
}

/// Get the current transcript and status of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.render(state.credential.is_selected()).await))
}

/// Close a session and release its transcript.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session with id '{}' not found", id)))
    }
}

/// Submit a message to the advisor and wait for its reply.
///
/// Empty messages and messages sent while a reply is pending are ignored;
/// the outcome says which.
#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    request_body = SubmitMessagePayload,
    responses(
        (status = 200, description = "Outcome of the submission", body = SubmitResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn submit_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitMessagePayload>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let outcome = session
        .controller
        .submit(&payload.text, payload.programmatic)
        .await;
    info!(session_id = %id, ?outcome, "Message submission settled");

    Ok(Json(SubmitResponse {
        outcome,
        view_hints: session.view.drain(),
        session: session.render(state.credential.is_selected()).await,
    }))
}

/// Submit a prompt on behalf of a shortcut elsewhere on the page.
#[utoipa::path(
    post,
    path = "/sessions/{id}/trigger",
    request_body = TriggerPromptPayload,
    responses(
        (status = 200, description = "Outcome of the submission", body = SubmitResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn trigger_prompt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TriggerPromptPayload>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let outcome = session.controller.trigger_from_external(&payload.prompt).await;
    info!(session_id = %id, ?outcome, "External prompt settled");

    Ok(Json(SubmitResponse {
        outcome,
        view_hints: session.view.drain(),
        session: session.render(state.credential.is_selected()).await,
    }))
}

/// Switch the session's locale. The transcript restarts with the new greeting.
#[utoipa::path(
    put,
    path = "/sessions/{id}/locale",
    request_body = ChangeLocalePayload,
    responses(
        (status = 200, description = "Locale changed", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn change_locale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeLocalePayload>,
) -> Result<Json<SessionView>, ApiError> {
    let session = find_session(&state, id).await?;
    session.controller.change_locale(payload.locale).await;
    Ok(Json(session.render(state.credential.is_selected()).await))
}

/// Start a new conversation in the current locale.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reset",
    responses(
        (status = 200, description = "Session reset", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = find_session(&state, id).await?;
    session.controller.reset().await;
    Ok(Json(session.render(state.credential.is_selected()).await))
}

/// Re-establish the access credential after a `CONNECTION_EXPIRED_OR_NOT_FOUND` signal.
///
/// A supplied `api_key` replaces the selected credential for every session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reconnect",
    request_body = ReconnectPayload,
    responses(
        (status = 200, description = "Session reconnected", body = SessionView),
        (status = 400, description = "No credential is selected", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn reconnect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReconnectPayload>,
) -> Result<Json<SessionView>, ApiError> {
    let session = find_session(&state, id).await?;

    if let Some(key) = payload.api_key.filter(|key| !key.trim().is_empty()) {
        state.credential.select(key.trim());
        info!(session_id = %id, "New access credential selected");
    }
    if !state.credential.is_selected() {
        warn!(session_id = %id, "Reconnect attempted without a credential");
        return Err(ApiError::BadRequest(
            "An access credential is required to reconnect".to_string(),
        ));
    }

    session.connection.reconnected();
    info!(session_id = %id, "Session reconnected");
    Ok(Json(session.render(true).await))
}

/// List the suggested prompts for a locale.
#[utoipa::path(
    get,
    path = "/prompts",
    responses(
        (status = 200, description = "Suggested prompts", body = [SuggestedPromptView])
    ),
    params(
        ("locale" = Option<String>, Query, description = "Locale code (`en` or `es`); defaults to the service locale")
    )
)]
pub async fn list_prompts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PromptsQuery>,
) -> Json<Vec<SuggestedPromptView>> {
    let locale = query.locale.unwrap_or(state.config.default_locale);
    Json(
        content(locale)
            .suggested_prompts
            .iter()
            .map(SuggestedPromptView::from)
            .collect(),
    )
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up", body = String)
    )
)]
pub async fn healthz() -> &'static str {
    "ok"
}
