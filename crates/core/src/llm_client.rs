use crate::{
    capability::CapabilityDeclaration,
    transcript::{Message, Role},
};
use anyhow::anyhow;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionToolArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FunctionObjectArgs,
    },
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, sync::RwLock};

/// Upstream error fragments that mean the access credential is missing,
/// expired, or invalid rather than the service being unavailable.
pub const CREDENTIAL_REJECTION_MARKERS: [&str; 3] = [
    "Requested entity was not found",
    "API key not valid",
    "API_KEY_INVALID",
];

/// Returns true when an upstream error message reports a bad credential.
pub fn is_credential_rejection(message: &str) -> bool {
    CREDENTIAL_REJECTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Everything one generation call needs: framing, prior turns, the new
/// utterance, and the capabilities the model may invoke instead of replying.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    pub history: Vec<Message>,
    pub new_utterance: String,
    pub capabilities: Vec<CapabilityDeclaration>,
}

/// A capability invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    /// Raw JSON arguments as sent by the model. Declared capabilities take none.
    pub arguments: String,
}

/// Represents the two possible outcomes of a successful generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMAction {
    /// The LLM decided to respond directly with text.
    TextResponse(String),
    /// The LLM decided to call one or more capabilities.
    ToolCall(Vec<ToolCall>),
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The upstream reported the caller's access credential as missing or invalid.
    #[error("Access credential rejected: {0}")]
    CredentialRejected(String),
    /// Any other failure: transport, rate limit, malformed response.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// A generic client for interacting with a hosted text-generation model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Makes a single, non-streaming call and reports whether the model
    /// answered in text or asked for a capability.
    async fn decide_action(&self, request: GenerationRequest) -> Result<LLMAction, GenerationError>;
}

/// The externally supplied access credential for the generation service.
///
/// It can be selected or replaced at runtime by the page's reconnect action;
/// clients read it on every call.
#[derive(Default)]
pub struct Credential {
    secret: RwLock<Option<SecretString>>,
}

impl Credential {
    pub fn new(key: Option<String>) -> Self {
        Self {
            secret: RwLock::new(
                key.filter(|k| !k.trim().is_empty())
                    .map(SecretString::from),
            ),
        }
    }

    pub fn select(&self, key: impl Into<String>) {
        if let Ok(mut secret) = self.secret.write() {
            *secret = Some(SecretString::from(key.into()));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut secret) = self.secret.write() {
            *secret = None;
        }
    }

    pub fn is_selected(&self) -> bool {
        self.secret.read().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Runs `f` with the exposed key, or returns `None` when none is selected.
    pub fn with_key<R>(&self, f: impl FnOnce(&str) -> R) -> Option<R> {
        let secret = self.secret.read().ok()?;
        secret.as_ref().map(|s| f(s.expose_secret()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("selected", &self.is_selected())
            .finish()
    }
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    api_base: String,
    model: String,
    temperature: f32,
    credential: std::sync::Arc<Credential>,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL of the chat-completions API.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    /// * `temperature` - Sampling temperature sent with every request.
    /// * `credential` - Shared access credential, read on each call.
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        credential: std::sync::Arc<Credential>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            model: model.into(),
            temperature,
            credential,
        }
    }

    fn build_request(
        &self,
        request: GenerationRequest,
    ) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.instruction)
                .build()?
                .into(),
        ];
        for msg in request.history {
            match msg.role {
                Role::User => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.text)
                        .build()?
                        .into(),
                ),
                Role::Model => messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(msg.text)
                        .build()?
                        .into(),
                ),
            }
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.new_utterance)
                .build()?
                .into(),
        );

        let tools = request
            .capabilities
            .iter()
            .map(|c| {
                ChatCompletionToolArgs::default()
                    .function(
                        FunctionObjectArgs::default()
                            .name(c.name)
                            .description(c.description)
                            .parameters(serde_json::json!({ "type": "object", "properties": {} }))
                            .build()?,
                    )
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            args.tools(tools).tool_choice("auto");
        }
        args.build()
    }
}

fn classify_openai_error(err: OpenAIError) -> GenerationError {
    let message = match &err {
        OpenAIError::ApiError(api) => api.message.clone(),
        other => other.to_string(),
    };
    if is_credential_rejection(&message) {
        GenerationError::CredentialRejected(message)
    } else {
        GenerationError::Upstream(err.into())
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn decide_action(&self, request: GenerationRequest) -> Result<LLMAction, GenerationError> {
        let config = self
            .credential
            .with_key(|key| {
                OpenAIConfig::new()
                    .with_api_key(key)
                    .with_api_base(&self.api_base)
            })
            .ok_or_else(|| {
                GenerationError::CredentialRejected("no access credential selected".to_string())
            })?;
        let client = Client::with_config(config);

        let request = self.build_request(request).map_err(classify_openai_error)?;
        let response: CreateChatCompletionResponse = client
            .chat()
            .create(request)
            .await
            .map_err(classify_openai_error)?;
        let choice = response
            .choices
            .first()
            .ok_or_else(|| anyhow!("LLM response contained no choices"))?;

        match &choice.message.tool_calls {
            Some(tool_calls) if !tool_calls.is_empty() => Ok(LLMAction::ToolCall(
                tool_calls
                    .iter()
                    .map(|call| ToolCall {
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.clone(),
                    })
                    .collect(),
            )),
            _ => Ok(LLMAction::TextResponse(
                choice.message.content.clone().unwrap_or_default(),
            )),
        }
    }
}
