//! Direct REST client for the Gemini `generateContent` endpoint.
//!
//! Talks to the native API (rather than the OpenAI-compatible shim) so that
//! function declarations and credential errors come back in Gemini's own
//! shape and can be classified precisely.

use crate::{
    capability::CapabilityDeclaration,
    llm_client::{
        Credential, GenerationError, GenerationRequest, LLMAction, LLMClient, ToolCall,
        is_credential_rejection,
    },
    transcript::Role,
};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// `LLMClient` implementation that calls the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    temperature: f32,
    credential: Arc<Credential>,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        credential: Arc<Credential>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            model: model.into(),
            temperature,
            credential,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn decide_action(&self, request: GenerationRequest) -> Result<LLMAction, GenerationError> {
        let api_key = self
            .credential
            .with_key(str::to_string)
            .ok_or_else(|| {
                GenerationError::CredentialRejected("no access credential selected".to_string())
            })?;

        let body = GenerateContentRequest::from_request(request, self.temperature);
        debug!(model = %self.model, turns = body.contents.len(), "Calling Gemini generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| anyhow!("Gemini API request failed: {err}"))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| anyhow!("Failed to parse Gemini response: {err}"))?;
        Ok(extract_action(parsed))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_request(request: GenerationRequest, temperature: f32) -> Self {
        let mut contents: Vec<Content> = request
            .history
            .into_iter()
            .map(|msg| Content::text(Some(wire_role(msg.role)), msg.text))
            .collect();
        contents.push(Content::text(Some("user"), request.new_utterance));

        let tools = if request.capabilities.is_empty() {
            vec![]
        } else {
            vec![Tool {
                function_declarations: request
                    .capabilities
                    .iter()
                    .map(FunctionDeclaration::from)
                    .collect(),
            }]
        };

        Self {
            system_instruction: Content::text(None, request.instruction),
            contents,
            tools,
            generation_config: GenerationConfig { temperature },
        }
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&'static str>, text: String) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

impl From<&CapabilityDeclaration> for FunctionDeclaration {
    fn from(declaration: &CapabilityDeclaration) -> Self {
        Self {
            name: declaration.name,
            description: declaration.description,
            parameters: serde_json::json!({ "type": "OBJECT", "properties": {} }),
        }
    }
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    function_call: Option<FunctionCallResponse>,
}

#[derive(Deserialize)]
struct FunctionCallResponse {
    name: String,
    #[serde(default)]
    args: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Function calls win over text; text parts are concatenated in order.
///
/// A blocked prompt or a candidate without content yields empty text.
fn extract_action(response: GenerateContentResponse) -> LLMAction {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next());
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let Some(parts) = candidate
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
    else {
        warn!(?block_reason, ?finish_reason, "Gemini returned no content");
        return LLMAction::TextResponse(String::new());
    };

    let calls: Vec<ToolCall> = parts
        .iter()
        .filter_map(|part| part.function_call.as_ref())
        .map(|call| ToolCall {
            name: call.name.clone(),
            arguments: call
                .args
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "{}".to_string()),
        })
        .collect();
    if !calls.is_empty() {
        return LLMAction::ToolCall(calls);
    }

    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    LLMAction::TextResponse(text)
}

fn map_http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    let credential_status = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
    if credential_status || is_credential_rejection(&message) || is_credential_rejection(body) {
        GenerationError::CredentialRejected(message)
    } else {
        GenerationError::Upstream(anyhow!("Gemini API returned {status}: {message}"))
    }
}
