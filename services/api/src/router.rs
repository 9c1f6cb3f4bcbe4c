//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ChangeLocalePayload, ConnectionState, CreateSessionPayload, ErrorResponse,
        ReconnectPayload, SessionView, SubmitMessagePayload, SubmitResponse, SuggestedPromptView,
        TranscriptMessage, TriggerPromptPayload,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session,
        handlers::get_session,
        handlers::delete_session,
        handlers::submit_message,
        handlers::trigger_prompt,
        handlers::change_locale,
        handlers::reset_session,
        handlers::reconnect,
        handlers::list_prompts,
        handlers::healthz,
    ),
    components(
        schemas(
            SessionView, TranscriptMessage, ConnectionState, SubmitResponse, CreateSessionPayload,
            SubmitMessagePayload, TriggerPromptPayload, ChangeLocalePayload, ReconnectPayload,
            SuggestedPromptView, ErrorResponse
        )
    ),
    tags(
        (name = "HIPAA Shield Advisor API", description = "Conversational compliance advisor sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/{id}/messages", post(handlers::submit_message))
        .route("/sessions/{id}/trigger", post(handlers::trigger_prompt))
        .route("/sessions/{id}/locale", put(handlers::change_locale))
        .route("/sessions/{id}/reset", post(handlers::reset_session))
        .route("/sessions/{id}/reconnect", post(handlers::reconnect))
        .route("/prompts", get(handlers::list_prompts))
        .route("/healthz", get(handlers::healthz))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
