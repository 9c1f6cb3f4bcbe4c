//! Advisor Controller
//!
//! Drives one request/response cycle per submission:
//! `idle -> user-turn-recorded -> awaiting-response -> {model-turn-recorded | reconnect-required} -> idle`.
//!
//! The busy flag in the [`TranscriptStore`] is the only concurrency guard. A
//! submission that arrives while a cycle is in flight is dropped, not queued.

use crate::{
    advice::{Advice, ComplianceAdvisor, RequestContext},
    llm_client::LLMClient,
    locale::Locale,
    transcript::{Message, TranscriptSnapshot, TranscriptStore},
};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tokio::{runtime::Handle, sync::Mutex};
use tracing::{debug, error, info, instrument, warn};

/// Why the page must ask the user to re-establish the access credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionClassification {
    #[serde(rename = "CONNECTION_EXPIRED_OR_NOT_FOUND")]
    ConnectionExpiredOrNotFound,
}

impl ConnectionClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionClassification::ConnectionExpiredOrNotFound => {
                "CONNECTION_EXPIRED_OR_NOT_FOUND"
            }
        }
    }
}

impl fmt::Display for ConnectionClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation requests the controller issues to the conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewHint {
    /// Clear the text field after a typed submission.
    ClearInput,
    /// Keep the newest message visible.
    ScrollToLatest,
    /// Bring the whole conversation panel into view.
    BringIntoView,
}

/// Receives the reconnect signal raised when the credential is rejected.
#[cfg_attr(test, mockall::automock)]
pub trait ReconnectSignal: Send + Sync {
    fn reconnect_required(&self, classification: ConnectionClassification);
}

/// The render layer's scroll/focus hooks.
pub trait ConversationView: Send + Sync {
    fn show(&self, hint: ViewHint);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    EmptyPrompt,
    Busy,
}

/// How a call to [`AdvisorController::submit`] ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Rejected before anything was recorded.
    Ignored { reason: IgnoreReason },
    /// A user turn and a model turn were appended.
    Answered { reply: String },
    /// The user turn was appended, the credential was rejected, and the
    /// reconnect signal was raised.
    ReconnectRequired,
    /// The transcript was reset while the call was in flight; the late reply
    /// was dropped.
    Discarded,
}

/// Clears the busy flag if a cycle is dropped before it settles, e.g. when the
/// caller is cancelled mid-request.
struct InFlight {
    store: Arc<Mutex<TranscriptStore>>,
    settled: bool,
}

impl InFlight {
    fn new(store: Arc<Mutex<TranscriptStore>>) -> Self {
        Self {
            store,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("Cycle cancelled before settlement; clearing busy flag");
        // Busy belongs to this cycle until cleared; no other cycle can have set it.
        match self.store.try_lock() {
            Ok(mut store) => store.set_busy(false),
            Err(_) => match Handle::try_current() {
                Ok(handle) => {
                    let store = self.store.clone();
                    handle.spawn(async move {
                        store.lock().await.set_busy(false);
                    });
                }
                Err(e) => error!(error = %e, "No runtime to clear busy flag on"),
            },
        }
    }
}

pub struct AdvisorController {
    store: Arc<Mutex<TranscriptStore>>,
    advisor: ComplianceAdvisor,
    reconnect: Arc<dyn ReconnectSignal>,
    view: Arc<dyn ConversationView>,
}

impl AdvisorController {
    /// Creates a controller with a freshly initialized transcript for `locale`.
    pub fn new(
        locale: Locale,
        client: Arc<dyn LLMClient>,
        reconnect: Arc<dyn ReconnectSignal>,
        view: Arc<dyn ConversationView>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(TranscriptStore::new(locale))),
            advisor: ComplianceAdvisor::new(client),
            reconnect,
            view,
        }
    }

    pub async fn snapshot(&self) -> TranscriptSnapshot {
        self.store.lock().await.snapshot()
    }

    pub async fn is_busy(&self) -> bool {
        self.store.lock().await.is_busy()
    }

    pub async fn locale(&self) -> Locale {
        self.store.lock().await.locale()
    }

    /// Replaces the transcript with the new locale's greeting.
    pub async fn change_locale(&self, locale: Locale) {
        let mut store = self.store.lock().await;
        store.initialize(locale);
        info!(%locale, "Transcript reset for locale change");
    }

    /// User-initiated "new session" in the current locale.
    pub async fn reset(&self) {
        let mut store = self.store.lock().await;
        let locale = store.locale();
        store.reset(locale);
        info!(%locale, "Transcript reset by user");
    }

    /// Runs one request/response cycle for `prompt_text`.
    ///
    /// `is_programmatic` marks shortcut-triggered prompts; they leave the text
    /// field untouched but are otherwise handled identically.
    #[instrument(name = "advisor_cycle", skip(self, prompt_text))]
    pub async fn submit(&self, prompt_text: &str, is_programmatic: bool) -> SubmitOutcome {
        let prompt = prompt_text.trim();
        if prompt.is_empty() {
            debug!("Ignoring empty prompt");
            return SubmitOutcome::Ignored {
                reason: IgnoreReason::EmptyPrompt,
            };
        }

        let context = {
            let mut store = self.store.lock().await;
            if store.is_busy() {
                debug!("Ignoring prompt while a cycle is in flight");
                return SubmitOutcome::Ignored {
                    reason: IgnoreReason::Busy,
                };
            }
            let history = store.messages().to_vec();
            if let Err(e) = store.append(Message::user(prompt)) {
                warn!(error = %e, "User turn rejected by transcript");
                return SubmitOutcome::Ignored {
                    reason: IgnoreReason::EmptyPrompt,
                };
            }
            store.set_busy(true);
            RequestContext {
                history,
                utterance: prompt.to_string(),
                locale: store.locale(),
                epoch: store.epoch(),
            }
        };

        if !is_programmatic {
            self.view.show(ViewHint::ClearInput);
        }
        self.view.show(ViewHint::ScrollToLatest);
        info!(locale = %context.locale, history_len = context.history.len(), "User turn recorded; awaiting response");

        let in_flight = InFlight::new(self.store.clone());
        let advice = self.advisor.advise(&context).await;

        let mut store = self.store.lock().await;
        store.set_busy(false);
        in_flight.settle();
        match advice {
            Advice::ConnectionExpired => {
                drop(store);
                let classification = ConnectionClassification::ConnectionExpiredOrNotFound;
                warn!(%classification, "Raising reconnect signal");
                self.reconnect.reconnect_required(classification);
                SubmitOutcome::ReconnectRequired
            }
            Advice::Reply(_) if store.epoch() != context.epoch => {
                info!(
                    submitted_locale = %context.locale,
                    current_locale = %store.locale(),
                    "Transcript was reset while awaiting response; discarding late reply"
                );
                SubmitOutcome::Discarded
            }
            Advice::Reply(reply) => {
                if let Err(e) = store.append(Message::model(reply.clone())) {
                    warn!(error = %e, "Model turn rejected by transcript");
                }
                drop(store);
                self.view.show(ViewHint::ScrollToLatest);
                info!(reply_len = reply.len(), "Model turn recorded");
                SubmitOutcome::Answered { reply }
            }
        }
    }

    /// Entry point for shortcuts elsewhere on the page: submits `prompt_text`
    /// programmatically, then asks the view to bring the conversation forward.
    pub async fn trigger_from_external(&self, prompt_text: &str) -> SubmitOutcome {
        let outcome = self.submit(prompt_text, true).await;
        self.view.show(ViewHint::BringIntoView);
        outcome
    }
}
