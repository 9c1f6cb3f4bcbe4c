//! API Models
//!
//! Request and response bodies of the page-facing REST API, annotated with
//! `utoipa` for the OpenAPI document.

use serde::{Deserialize, Serialize};
use shield_advisor_core::{
    Locale, Message, Role, SubmitOutcome, ViewHint, content::SuggestedPrompt,
};
use utoipa::ToSchema;
use uuid::Uuid;

/// Whether the page must prompt the user to re-establish the access credential.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    ReconnectRequired,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct TranscriptMessage {
    #[schema(value_type = String, example = "user")]
    pub role: Role,
    pub text: String,
}

impl From<Message> for TranscriptMessage {
    fn from(message: Message) -> Self {
        Self {
            role: message.role,
            text: message.text,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct SessionView {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    #[schema(value_type = String, example = "en")]
    pub locale: Locale,
    pub busy: bool,
    #[schema(example = "Alignment Network Active")]
    pub status_label: String,
    pub connection: ConnectionState,
    pub credential_selected: bool,
    pub messages: Vec<TranscriptMessage>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct CreateSessionPayload {
    #[schema(value_type = Option<String>, example = "en")]
    #[serde(default)]
    pub locale: Option<Locale>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitMessagePayload {
    #[schema(example = "What is Part 2?")]
    pub text: String,
    /// True when a suggested-prompt shortcut, rather than the text field, submitted.
    #[serde(default)]
    pub programmatic: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct TriggerPromptPayload {
    #[schema(example = "How should we audit vendors for 42 CFR Part 2 alignment?")]
    pub prompt: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangeLocalePayload {
    #[schema(value_type = String, example = "es")]
    pub locale: Locale,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct ReconnectPayload {
    /// A fresh access credential. Omit to keep the currently selected one.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitResponse {
    /// Tagged by `status`: `ignored`, `answered`, `reconnect_required` or `discarded`.
    #[schema(value_type = Object)]
    pub outcome: SubmitOutcome,
    /// `clear_input`, `scroll_to_latest` or `bring_into_view`, in emission order.
    #[schema(value_type = Vec<String>)]
    pub view_hints: Vec<ViewHint>,
    pub session: SessionView,
}

#[derive(Deserialize, Debug, Default)]
pub struct PromptsQuery {
    pub locale: Option<Locale>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct SuggestedPromptView {
    pub label: String,
    pub prompt: String,
}

impl From<&SuggestedPrompt> for SuggestedPromptView {
    fn from(prompt: &SuggestedPrompt) -> Self {
        Self {
            label: prompt.label.to_string(),
            prompt: prompt.prompt.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_serialization() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::ReconnectRequired).unwrap(),
            "\"reconnect_required\""
        );
        let parsed: ConnectionState = serde_json::from_str("\"connected\"").unwrap();
        assert_eq!(parsed, ConnectionState::Connected);
    }

    #[test]
    fn test_create_session_payload_locale_is_optional() {
        let payload: CreateSessionPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.locale, None);

        let payload: CreateSessionPayload = serde_json::from_str(r#"{"locale":"es"}"#).unwrap();
        assert_eq!(payload.locale, Some(Locale::Es));
    }

    #[test]
    fn test_change_locale_payload_rejects_unknown_locale() {
        let result: Result<ChangeLocalePayload, _> = serde_json::from_str(r#"{"locale":"fr"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_submit_payload_defaults_to_typed_input() {
        let payload: SubmitMessagePayload =
            serde_json::from_str(r#"{"text":"What is Part 2?"}"#).unwrap();
        assert_eq!(payload.text, "What is Part 2?");
        assert!(!payload.programmatic);
    }

    #[test]
    fn test_submit_payload_missing_text() {
        let result: Result<SubmitMessagePayload, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_transcript_message_from_core() {
        let message = TranscriptMessage::from(Message::model("hello"));
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"hello"}"#);
    }

    #[test]
    fn test_submit_response_serialization() {
        let response = SubmitResponse {
            outcome: SubmitOutcome::ReconnectRequired,
            view_hints: vec![ViewHint::ScrollToLatest],
            session: SessionView {
                id: Uuid::nil(),
                locale: Locale::En,
                busy: false,
                status_label: "Alignment Network Active".to_string(),
                connection: ConnectionState::ReconnectRequired,
                credential_selected: false,
                messages: vec![],
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outcome"]["status"], "reconnect_required");
        assert_eq!(json["view_hints"][0], "scroll_to_latest");
        assert_eq!(json["session"]["connection"], "reconnect_required");
        assert_eq!(json["session"]["locale"], "en");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Session not found".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Session not found"}"#);
    }
}
