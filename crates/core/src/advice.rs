//! Compliance Advice Service
//!
//! Wraps an [`LLMClient`] and turns every possible generation outcome into
//! something the controller can act on without further branching: a reply to
//! append, or the connection-expired signal.

use crate::{
    capability::Capability,
    content::content,
    instruction::system_instruction,
    llm_client::{GenerationError, GenerationRequest, LLMAction, LLMClient},
    locale::Locale,
    transcript::Message,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Snapshot handed to one generation call and dropped once it settles.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Transcript as it stood before the new user turn was recorded.
    pub history: Vec<Message>,
    pub utterance: String,
    pub locale: Locale,
    /// Store epoch at submission; a mismatch on settlement means the
    /// transcript was reset while the call was in flight.
    pub epoch: u64,
}

/// What one generation call amounts to, as far as the transcript cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    /// Text to record as the model's turn. Capability results and the
    /// offline notice arrive here too.
    Reply(String),
    /// The access credential is missing or invalid; nothing is recorded.
    ConnectionExpired,
}

#[derive(Clone)]
pub struct ComplianceAdvisor {
    client: Arc<dyn LLMClient>,
}

impl ComplianceAdvisor {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    /// Runs one generation call for `context` and resolves the outcome.
    ///
    /// Never fails: credential problems become [`Advice::ConnectionExpired`],
    /// everything else that goes wrong becomes the locale's offline notice.
    pub async fn advise(&self, context: &RequestContext) -> Advice {
        let locale = context.locale;
        let local = content(locale);
        let request = GenerationRequest {
            instruction: system_instruction(locale),
            history: context.history.clone(),
            new_utterance: context.utterance.clone(),
            capabilities: Capability::declarations(),
        };

        match self.client.decide_action(request).await {
            Ok(LLMAction::TextResponse(text)) if text.trim().is_empty() => {
                Advice::Reply(local.idle_fallback().to_string())
            }
            Ok(LLMAction::TextResponse(text)) => Advice::Reply(text),
            Ok(LLMAction::ToolCall(calls)) => {
                let requested = calls.first().map(|call| call.name.as_str());
                match requested.and_then(Capability::from_name) {
                    Some(capability) => {
                        info!(capability = capability.name(), "Resolving capability locally");
                        Advice::Reply(capability.resolve(locale))
                    }
                    None => {
                        warn!(?requested, "Model requested an undeclared capability");
                        Advice::Reply(local.idle_fallback().to_string())
                    }
                }
            }
            Err(GenerationError::CredentialRejected(reason)) => {
                warn!(%reason, "Generation credential rejected");
                Advice::ConnectionExpired
            }
            Err(GenerationError::Upstream(err)) => {
                error!(error = ?err, "Generation call failed");
                Advice::Reply(local.offline_notice())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content::{CONTACT_EMAIL, ENGAGEMENT_PAYMENT_LINK},
        llm_client::{MockLLMClient, ToolCall},
    };
    use anyhow::anyhow;

    fn context(locale: Locale) -> RequestContext {
        RequestContext {
            history: vec![Message::model(content(locale).greeting)],
            utterance: "What is Part 2?".to_string(),
            locale,
            epoch: 1,
        }
    }

    fn advisor_returning(
        result: impl Fn() -> Result<LLMAction, GenerationError> + Send + Sync + 'static,
    ) -> ComplianceAdvisor {
        let mut client = MockLLMClient::new();
        client.expect_decide_action().returning(move |_| result());
        ComplianceAdvisor::new(Arc::new(client))
    }

    fn tool_call(name: &str) -> LLMAction {
        LLMAction::ToolCall(vec![ToolCall {
            name: name.to_string(),
            arguments: "{}".to_string(),
        }])
    }

    #[tokio::test]
    async fn test_request_carries_context() {
        let mut client = MockLLMClient::new();
        client
            .expect_decide_action()
            .withf(|req| {
                req.new_utterance == "What is Part 2?"
                    && req.history.len() == 1
                    && req.instruction.contains("Spanish")
                    && req.capabilities.len() == 2
            })
            .times(1)
            .returning(|_| Ok(LLMAction::TextResponse("ok".to_string())));
        let advisor = ComplianceAdvisor::new(Arc::new(client));

        assert_eq!(
            advisor.advise(&context(Locale::Es)).await,
            Advice::Reply("ok".to_string())
        );
    }

    #[tokio::test]
    async fn test_payment_link_capability_resolves_to_link() {
        let advisor = advisor_returning(|| Ok(tool_call("getEngagementLink")));
        match advisor.advise(&context(Locale::En)).await {
            Advice::Reply(text) => assert!(text.contains(ENGAGEMENT_PAYMENT_LINK)),
            other => panic!("Expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_contact_capability_resolves_in_locale() {
        let advisor = advisor_returning(|| Ok(tool_call("getContactEmail")));
        assert_eq!(
            advisor.advise(&context(Locale::Es)).await,
            Advice::Reply(content(Locale::Es).contact_email_reply())
        );
        assert!(content(Locale::Es).contact_email_reply().contains(CONTACT_EMAIL));
    }

    #[tokio::test]
    async fn test_unknown_capability_falls_back() {
        let advisor = advisor_returning(|| Ok(tool_call("deleteEverything")));
        assert_eq!(
            advisor.advise(&context(Locale::En)).await,
            Advice::Reply(content(Locale::En).idle_fallback().to_string())
        );
    }

    #[tokio::test]
    async fn test_blank_text_falls_back() {
        let advisor = advisor_returning(|| Ok(LLMAction::TextResponse("  ".to_string())));
        assert_eq!(
            advisor.advise(&context(Locale::Es)).await,
            Advice::Reply(content(Locale::Es).idle_fallback().to_string())
        );
    }

    #[tokio::test]
    async fn test_credential_rejection_maps_to_connection_expired() {
        let advisor = advisor_returning(|| {
            Err(GenerationError::CredentialRejected(
                "Requested entity was not found.".to_string(),
            ))
        });
        assert_eq!(
            advisor.advise(&context(Locale::En)).await,
            Advice::ConnectionExpired
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_offline_notice() {
        let advisor = advisor_returning(|| Err(GenerationError::Upstream(anyhow!("socket closed"))));
        assert_eq!(
            advisor.advise(&context(Locale::En)).await,
            Advice::Reply(content(Locale::En).offline_notice())
        );
    }
}
