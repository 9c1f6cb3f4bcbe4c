//! Core of the HIPAA Shield advisor: the session transcript, the controller
//! that drives one generation cycle per user message, and the clients for the
//! hosted model.

pub mod advice;
pub mod capability;
pub mod content;
pub mod controller;
pub mod gemini;
pub mod instruction;
pub mod llm_client;
pub mod locale;
pub mod transcript;

pub use controller::{
    AdvisorController, ConnectionClassification, ConversationView, IgnoreReason, ReconnectSignal,
    SubmitOutcome, ViewHint,
};
pub use locale::Locale;
pub use transcript::{Message, Role, TranscriptSnapshot};
